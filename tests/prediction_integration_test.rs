mod common;

use common::*;
use diabetes_health_manager::ml::features::{FeatureVector, FeatureVectorBuilder};
use diabetes_health_manager::ml::{PredictionService, RiskClassifier};
use diabetes_health_manager::models::{
    round_percent, HistoryRecord, MedicalInput, RiskLabel, UserId,
};
use diabetes_health_manager::state::{HistoryStore, InMemoryHistoryStore};
use std::sync::Arc;

#[tokio::test]
async fn prediction_is_deterministic() {
    let (service, _store) = memory_service();
    let user = user("alice@example.com");

    let first = service.predict(&sample_input(), &user).await.unwrap();
    let second = service.predict(&sample_input(), &user).await.unwrap();

    assert_eq!(first.result.probability, second.result.probability);
    assert_eq!(first.result.risk_percent, second.result.risk_percent);
    assert_eq!(first.result.label, second.result.label);
}

#[tokio::test]
async fn risk_percent_obeys_rounding_law() {
    let (service, _store) = memory_service();
    let user = user("alice@example.com");

    let report = service.predict(&sample_input(), &user).await.unwrap();
    assert_eq!(
        report.result.risk_percent,
        round_percent(report.result.probability * 100.0)
    );

    // The law itself on a fixed value
    assert_eq!(round_percent(0.8231 * 100.0), 82.31);
}

#[tokio::test]
async fn label_agrees_with_probability_and_threshold() {
    let classifier = demo_classifier();
    let (service, _store) = memory_service();
    let user = user("alice@example.com");

    let inputs = [
        sample_input(),
        MedicalInput { glucose: 90, bmi: 22.0, diabetes_pedigree_function: 0.2, ..sample_input() },
        MedicalInput { glucose: 128, ..sample_input() },
    ];

    for input in inputs {
        let report = service.predict(&input, &user).await.unwrap();
        let expected_positive = report.result.probability >= classifier.threshold();
        assert_eq!(
            report.result.label == RiskLabel::Positive,
            expected_positive,
            "label and probability disagree for {:?}",
            input
        );
    }
}

#[test]
fn swapping_two_values_changes_the_probability() {
    let classifier = demo_classifier();

    // Same eight numbers, glucose and blood pressure exchanged. The
    // classifier reads positionally, so the swap must change its output.
    let ordered = FeatureVector::from_values([2.0, 150.0, 80.0, 25.0, 100.0, 32.0, 0.6, 45.0]);
    let swapped = FeatureVector::from_values([2.0, 80.0, 150.0, 25.0, 100.0, 32.0, 0.6, 45.0]);

    let p_ordered = classifier.predict_proba(&ordered).unwrap();
    let p_swapped = classifier.predict_proba(&swapped).unwrap();
    assert_ne!(p_ordered, p_swapped);
}

#[tokio::test]
async fn out_of_bounds_input_never_reaches_the_classifier() {
    let (service, store) = memory_service();
    let user = user("alice@example.com");

    let input = MedicalInput { age: 0, ..sample_input() };
    let err = service.predict(&input, &user).await.unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");
    assert!(err.to_string().contains("age"));

    // A rejected input must leave no trace in history
    assert!(store.list(&user).await.unwrap().is_empty());
}

#[test]
fn builder_rejects_each_out_of_range_field() {
    let cases = [
        ("pregnancies", MedicalInput { pregnancies: 21, ..sample_input() }),
        ("glucose", MedicalInput { glucose: 250, ..sample_input() }),
        ("blood_pressure", MedicalInput { blood_pressure: 151, ..sample_input() }),
        ("skin_thickness", MedicalInput { skin_thickness: 101, ..sample_input() }),
        ("insulin", MedicalInput { insulin: 901, ..sample_input() }),
        ("bmi", MedicalInput { bmi: 70.0, ..sample_input() }),
        ("diabetes_pedigree_function", MedicalInput { diabetes_pedigree_function: 3.0, ..sample_input() }),
        ("age", MedicalInput { age: 121, ..sample_input() }),
    ];

    for (field, input) in cases {
        let err = FeatureVectorBuilder::build(&input).unwrap_err();
        assert!(
            err.to_string().contains(field),
            "expected error naming '{}', got: {}",
            field,
            err
        );
    }
}

#[tokio::test]
async fn shipped_artifact_end_to_end_scenario() {
    // The fixed scenario: this exact input against the shipped artifact
    // must keep producing the same risk percent across runs.
    let classifier = Arc::new(RiskClassifier::load(SHIPPED_ARTIFACT).unwrap());
    let store: Arc<dyn HistoryStore> = Arc::new(InMemoryHistoryStore::new());
    let service = PredictionService::new(classifier, store.clone(), chrono_tz::UTC);
    let user = UserId::new("scenario@example.com").unwrap();

    let report = service.predict(&sample_input(), &user).await.unwrap();
    assert_eq!(report.result.risk_percent, 73.89);
    assert_eq!(report.result.label, RiskLabel::Positive);
    assert!(report.is_saved());

    // The appended record carries the same eight inputs, risk and label
    let records = store.list(&user).await.unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record, &HistoryRecord::from(&report.result));
    assert_eq!(record.pregnancies, 2);
    assert_eq!(record.glucose, 150);
    assert_eq!(record.bmi, 32.0);
    assert_eq!(record.risk_percent, 73.89);
    assert_eq!(record.prediction, RiskLabel::Positive);

    // ... and shows up verbatim in the CSV export
    let csv = String::from_utf8(store.export_csv(&user).await.unwrap()).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "pregnancies,glucose,blood_pressure,skin_thickness,insulin,bmi,diabetes_pedigree_function,age,risk_percent,prediction,timestamp"
    );
    let row = lines.next().unwrap();
    assert!(row.starts_with("2,150,80,25,100,32.0,0.6,45,73.89,Positive,"));
}

#[test]
fn missing_artifact_is_model_unavailable() {
    let err = RiskClassifier::load("data/model/no_such_model.json").unwrap_err();
    assert_eq!(err.error_code(), "MODEL_UNAVAILABLE");
}

#[test]
fn tampered_artifact_schema_is_rejected() {
    let mut artifact = demo_artifact();
    artifact.feature_names.swap(1, 2);
    let err = RiskClassifier::from_artifact(artifact).unwrap_err();
    assert_eq!(err.error_code(), "MODEL_UNAVAILABLE");
}

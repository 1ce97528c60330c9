mod common;

use common::*;
use diabetes_health_manager::explain::ExplanationEngine;
use diabetes_health_manager::ml::features::FeatureVectorBuilder;
use diabetes_health_manager::ml::{metrics, ReferenceDataset, RiskClassifier};
use std::sync::Arc;

fn shipped_engine() -> ExplanationEngine {
    let classifier = Arc::new(RiskClassifier::load(SHIPPED_ARTIFACT).unwrap());
    let dataset = Arc::new(ReferenceDataset::load(SHIPPED_REFERENCE_DATA).unwrap());
    ExplanationEngine::new(classifier, dataset)
}

#[test]
fn attributions_reconstruct_the_prediction() {
    let engine = shipped_engine();
    let vector = FeatureVectorBuilder::build(&sample_input()).unwrap();

    let explanation = engine.explain(&vector).unwrap();
    let total: f64 = explanation.attributions.iter().map(|a| a.attribution).sum();

    assert!((explanation.base_value + total - explanation.prediction).abs() < 1e-9);

    // The same classifier instance serves prediction and explanation, so
    // the explained prediction equals the served probability.
    let classifier = RiskClassifier::load(SHIPPED_ARTIFACT).unwrap();
    let probability = classifier.predict_proba(&vector).unwrap();
    assert!((explanation.prediction - probability).abs() < 1e-12);
}

#[test]
fn features_the_model_ignores_get_zero_attribution() {
    let engine = shipped_engine();
    let vector = FeatureVectorBuilder::build(&sample_input()).unwrap();
    let explanation = engine.explain(&vector).unwrap();

    // The shipped forest splits on Glucose, BMI, DiabetesPedigreeFunction
    // and Age only.
    for attribution in &explanation.attributions {
        match attribution.feature.as_str() {
            "Glucose" | "BMI" | "DiabetesPedigreeFunction" | "Age" => {}
            other => assert_eq!(
                attribution.attribution, 0.0,
                "unused feature {} must contribute nothing",
                other
            ),
        }
    }
}

#[test]
fn attributions_are_ranked_and_reproducible() {
    let engine = shipped_engine();
    let vector = FeatureVectorBuilder::build(&sample_input()).unwrap();

    let first = engine.explain(&vector).unwrap();
    let second = engine.explain(&vector).unwrap();

    for pair in first.attributions.windows(2) {
        assert!(pair[0].attribution.abs() >= pair[1].attribution.abs());
    }
    for (a, b) in first.attributions.iter().zip(second.attributions.iter()) {
        assert_eq!(a.feature, b.feature);
        assert_eq!(a.attribution, b.attribution);
    }
}

#[test]
fn permutation_importance_is_reproducible_and_ignores_unused_features() {
    let first = shipped_engine().permutation_importance(5).unwrap();
    let second = shipped_engine().permutation_importance(5).unwrap();

    assert_eq!(first.len(), 8);
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.feature, b.feature);
        assert_eq!(a.importance, b.importance);
    }

    // Shuffling a column the forest never reads cannot change accuracy
    for importance in &first {
        match importance.feature.as_str() {
            "Glucose" | "BMI" | "DiabetesPedigreeFunction" | "Age" => {}
            _ => assert_eq!(importance.importance, 0.0),
        }
    }
}

#[test]
fn performance_report_is_consistent_with_confusion_matrix() {
    let classifier = RiskClassifier::load(SHIPPED_ARTIFACT).unwrap();
    let dataset = ReferenceDataset::load(SHIPPED_REFERENCE_DATA).unwrap();

    let performance = metrics::evaluate(&classifier, &dataset).unwrap();
    let confusion = performance.confusion_matrix;

    let total: usize = confusion.iter().flatten().sum();
    assert_eq!(total, dataset.n_samples());

    let correct = confusion[0][0] + confusion[1][1];
    assert!((performance.accuracy - correct as f64 / total as f64).abs() < 1e-12);

    assert_eq!(performance.negative.support, confusion[0][0] + confusion[0][1]);
    assert_eq!(performance.positive.support, confusion[1][0] + confusion[1][1]);
}

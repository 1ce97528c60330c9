//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use chrono::Utc;
use diabetes_health_manager::ml::artifact::{DecisionTree, ModelArtifact, SUPPORTED_FORMAT_VERSION};
use diabetes_health_manager::ml::features::FEATURE_NAMES;
use diabetes_health_manager::ml::{PredictionService, RiskClassifier};
use diabetes_health_manager::models::{MedicalInput, UserId};
use diabetes_health_manager::state::{HistoryStore, InMemoryHistoryStore};
use std::sync::Arc;

/// Path of the artifact shipped with the repository
pub const SHIPPED_ARTIFACT: &str = "data/model/diabetes_model.json";

/// Path of the reference dataset shipped with the repository
pub const SHIPPED_REFERENCE_DATA: &str = "data/diabetes_reference.csv";

/// Small forest mirroring the shipped artifact's structure
pub fn demo_artifact() -> ModelArtifact {
    let stump = |feature: i32, threshold: f64, left: [f64; 2], right: [f64; 2]| DecisionTree {
        children_left: vec![1, -1, -1],
        children_right: vec![2, -1, -1],
        feature: vec![feature, -2, -2],
        threshold: vec![threshold, 0.0, 0.0],
        value: vec![[0.0, 0.0], left, right],
    };

    ModelArtifact {
        format_version: SUPPORTED_FORMAT_VERSION,
        model_version: "test-forest".to_string(),
        trained_at: Utc::now(),
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        threshold: 0.5,
        trees: vec![
            stump(1, 127.5, [80.0, 20.0], [15.0, 45.0]),
            stump(5, 29.95, [70.0, 15.0], [10.0, 40.0]),
            stump(6, 0.5275, [65.0, 25.0], [20.0, 40.0]),
        ],
    }
}

pub fn demo_classifier() -> Arc<RiskClassifier> {
    Arc::new(RiskClassifier::from_artifact(demo_artifact()).unwrap())
}

pub fn memory_service() -> (PredictionService, Arc<dyn HistoryStore>) {
    let store: Arc<dyn HistoryStore> = Arc::new(InMemoryHistoryStore::new());
    let service = PredictionService::new(demo_classifier(), store.clone(), chrono_tz::UTC);
    (service, store)
}

pub fn sample_input() -> MedicalInput {
    MedicalInput {
        pregnancies: 2,
        glucose: 150,
        blood_pressure: 80,
        skin_thickness: 25,
        insulin: 100,
        bmi: 32.0,
        diabetes_pedigree_function: 0.6,
        age: 45,
    }
}

pub fn user(email: &str) -> UserId {
    UserId::new(email).unwrap()
}

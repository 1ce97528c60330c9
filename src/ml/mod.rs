//! Risk classification: feature assembly, the trained classifier artifact,
//! the prediction pipeline, and model evaluation.

pub mod artifact;
pub mod classifier;
pub mod dataset;
pub mod features;
pub mod metrics;
pub mod service;

pub use artifact::ModelArtifact;
pub use classifier::RiskClassifier;
pub use dataset::ReferenceDataset;
pub use features::{FeatureVector, FeatureVectorBuilder, FEATURE_COUNT, FEATURE_NAMES};
pub use metrics::ModelPerformance;
pub use service::PredictionService;

use crate::error::{AppError, Result};
use crate::ml::artifact::ModelArtifact;
use crate::ml::features::FeatureVector;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Wrapper over the trained classifier artifact. Loaded once per process at
/// startup, read-only afterwards, shared by the prediction and explanation
/// paths. Inference is deterministic: the same vector always yields the
/// same probability.
#[derive(Debug)]
pub struct RiskClassifier {
    artifact: ModelArtifact,
}

/// Summary of the loaded model, for the model-info endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ClassifierInfo {
    pub model_version: String,
    pub trained_at: DateTime<Utc>,
    pub n_trees: usize,
    pub threshold: f64,
    pub feature_names: Vec<String>,
}

impl RiskClassifier {
    /// Load the classifier from an artifact file. A failure here is fatal
    /// for every prediction-dependent feature.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let artifact = ModelArtifact::load(path)?;
        Ok(RiskClassifier { artifact })
    }

    /// Build from an already-parsed artifact (validated here as well)
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        artifact.validate()?;
        Ok(RiskClassifier { artifact })
    }

    /// P(positive) for one feature vector: the mean positive-class fraction
    /// across the forest's leaves.
    pub fn predict_proba(&self, vector: &FeatureVector) -> Result<f64> {
        let x = vector.values();
        let mut total = 0.0;

        for tree in &self.artifact.trees {
            let mut idx = 0usize;
            // Bounded by node count; load-time validation keeps indices in
            // range, the step limit guards against cyclic trees.
            let mut steps = 0usize;
            while tree.children_left[idx] >= 0 {
                let feature = tree.feature[idx] as usize;
                idx = if x[feature] <= tree.threshold[idx] {
                    tree.children_left[idx] as usize
                } else {
                    tree.children_right[idx] as usize
                };
                steps += 1;
                if steps > tree.n_nodes() {
                    return Err(AppError::Prediction(
                        "classifier tree walk did not terminate".to_string(),
                    ));
                }
            }
            let [neg, pos] = tree.value[idx];
            total += pos / (neg + pos);
        }

        let probability = total / self.artifact.trees.len() as f64;
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(AppError::Prediction(format!(
                "classifier produced an invalid probability: {}",
                probability
            )));
        }
        Ok(probability)
    }

    /// Predicted label code: 1 iff P(positive) reaches the artifact's own
    /// decision threshold. Derived from the same probability, so label and
    /// probability can never disagree.
    pub fn predict(&self, vector: &FeatureVector) -> Result<u8> {
        let probability = self.predict_proba(vector)?;
        Ok(u8::from(probability >= self.artifact.threshold))
    }

    pub fn threshold(&self) -> f64 {
        self.artifact.threshold
    }

    pub fn model_version(&self) -> &str {
        &self.artifact.model_version
    }

    pub fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            model_version: self.artifact.model_version.clone(),
            trained_at: self.artifact.trained_at,
            n_trees: self.artifact.trees.len(),
            threshold: self.artifact.threshold,
            feature_names: self.artifact.feature_names.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::artifact::{DecisionTree, SUPPORTED_FORMAT_VERSION};
    use crate::ml::features::{FeatureVector, FEATURE_NAMES};

    fn stump(feature: i32, threshold: f64, left: [f64; 2], right: [f64; 2]) -> DecisionTree {
        DecisionTree {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![feature, -2, -2],
            threshold: vec![threshold, 0.0, 0.0],
            value: vec![[0.0, 0.0], left, right],
        }
    }

    fn test_classifier() -> RiskClassifier {
        let artifact = ModelArtifact {
            format_version: SUPPORTED_FORMAT_VERSION,
            model_version: "test".to_string(),
            trained_at: Utc::now(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            threshold: 0.5,
            // Glucose stump and BMI stump
            trees: vec![
                stump(1, 127.5, [80.0, 20.0], [15.0, 45.0]),
                stump(5, 29.95, [70.0, 30.0], [20.0, 60.0]),
            ],
        };
        RiskClassifier::from_artifact(artifact).unwrap()
    }

    fn vector(glucose: f64, bmi: f64) -> FeatureVector {
        FeatureVector::from_values([2.0, glucose, 80.0, 25.0, 100.0, bmi, 0.6, 45.0])
    }

    #[test]
    fn test_predict_proba_averages_leaf_fractions() {
        let classifier = test_classifier();
        // glucose 150 -> 45/60 = 0.75; bmi 32 -> 60/80 = 0.75
        let p = classifier.predict_proba(&vector(150.0, 32.0)).unwrap();
        assert!((p - 0.75).abs() < 1e-12);

        // glucose 100 -> 20/100 = 0.2; bmi 25 -> 30/100 = 0.3
        let p = classifier.predict_proba(&vector(100.0, 25.0)).unwrap();
        assert!((p - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_predict_is_consistent_with_threshold() {
        let classifier = test_classifier();
        for v in [vector(150.0, 32.0), vector(100.0, 25.0), vector(128.0, 25.0)] {
            let p = classifier.predict_proba(&v).unwrap();
            let label = classifier.predict(&v).unwrap();
            assert_eq!(label == 1, p >= classifier.threshold());
        }
    }

    #[test]
    fn test_inference_is_deterministic() {
        let classifier = test_classifier();
        let v = vector(137.0, 43.1);
        let first = classifier.predict_proba(&v).unwrap();
        for _ in 0..10 {
            assert_eq!(classifier.predict_proba(&v).unwrap(), first);
        }
    }

    #[test]
    fn test_value_order_changes_prediction() {
        let classifier = test_classifier();
        // Swap glucose and blood pressure values without reordering names:
        // the classifier must see a different record.
        let ordered = FeatureVector::from_values([2.0, 150.0, 80.0, 25.0, 100.0, 32.0, 0.6, 45.0]);
        let swapped = FeatureVector::from_values([2.0, 80.0, 150.0, 25.0, 100.0, 32.0, 0.6, 45.0]);
        let p_ordered = classifier.predict_proba(&ordered).unwrap();
        let p_swapped = classifier.predict_proba(&swapped).unwrap();
        assert_ne!(p_ordered, p_swapped);
    }
}

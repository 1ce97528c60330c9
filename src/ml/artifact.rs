use crate::error::{AppError, Result};
use crate::ml::features::{FEATURE_COUNT, FEATURE_NAMES};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Artifact format version this build understands
pub const SUPPORTED_FORMAT_VERSION: u32 = 1;

/// The trained classifier artifact as exported by the offline training
/// pipeline: a random forest in flattened array form plus its feature
/// schema. The schema carries the exact training-time feature order and is
/// verified on load; the trees themselves are opaque to the rest of the
/// system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Serialization format version
    pub format_version: u32,

    /// Human-readable model version (e.g. "2024.09-rf100")
    pub model_version: String,

    /// When the model was trained
    pub trained_at: DateTime<Utc>,

    /// Feature names in training order; must match the canonical order
    pub feature_names: Vec<String>,

    /// Decision threshold on P(positive)
    pub threshold: f64,

    /// The forest
    pub trees: Vec<DecisionTree>,
}

/// One decision tree in flattened array form. Node `i` is internal when
/// `children_left[i] >= 0` and a leaf otherwise; `value[i]` holds the
/// training-sample class counts `[negative, positive]` at that node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i32>,
    pub children_right: Vec<i32>,
    pub feature: Vec<i32>,
    pub threshold: Vec<f64>,
    pub value: Vec<[f64; 2]>,
}

impl DecisionTree {
    pub fn n_nodes(&self) -> usize {
        self.children_left.len()
    }
}

impl ModelArtifact {
    /// Read and validate an artifact from disk. Every failure maps to
    /// `ModelUnavailable`: there is no safe fallback for a missing or
    /// corrupt classifier.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::ModelUnavailable(format!(
                "cannot read classifier artifact at {}: {}",
                path.display(),
                e
            ))
        })?;

        let artifact: ModelArtifact = serde_json::from_str(&raw).map_err(|e| {
            AppError::ModelUnavailable(format!(
                "classifier artifact at {} is corrupt: {}",
                path.display(),
                e
            ))
        })?;

        artifact.validate()?;

        tracing::info!(
            path = %path.display(),
            model_version = %artifact.model_version,
            n_trees = artifact.trees.len(),
            "Classifier artifact loaded"
        );

        Ok(artifact)
    }

    /// Structural validation: schema order, tree shape, node sanity
    pub fn validate(&self) -> Result<()> {
        if self.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(AppError::ModelUnavailable(format!(
                "unsupported artifact format version {} (expected {})",
                self.format_version, SUPPORTED_FORMAT_VERSION
            )));
        }

        // The single most important invariant in the system: the artifact's
        // feature schema must equal the canonical names in the same order.
        if self.feature_names.len() != FEATURE_COUNT {
            return Err(AppError::ModelUnavailable(format!(
                "artifact declares {} features, expected {}",
                self.feature_names.len(),
                FEATURE_COUNT
            )));
        }
        for (idx, (declared, expected)) in self
            .feature_names
            .iter()
            .zip(FEATURE_NAMES.iter())
            .enumerate()
        {
            if declared != expected {
                return Err(AppError::ModelUnavailable(format!(
                    "artifact feature schema mismatch at position {}: found '{}', expected '{}'",
                    idx, declared, expected
                )));
            }
        }

        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(AppError::ModelUnavailable(format!(
                "decision threshold {} is outside (0, 1)",
                self.threshold
            )));
        }

        if self.trees.is_empty() {
            return Err(AppError::ModelUnavailable(
                "artifact contains no trees".to_string(),
            ));
        }

        for (tree_idx, tree) in self.trees.iter().enumerate() {
            Self::validate_tree(tree_idx, tree)?;
        }

        Ok(())
    }

    fn validate_tree(tree_idx: usize, tree: &DecisionTree) -> Result<()> {
        let n = tree.n_nodes();
        let malformed = |msg: String| {
            AppError::ModelUnavailable(format!("tree {} is malformed: {}", tree_idx, msg))
        };

        if n == 0 {
            return Err(malformed("tree has no nodes".to_string()));
        }
        if tree.children_right.len() != n
            || tree.feature.len() != n
            || tree.threshold.len() != n
            || tree.value.len() != n
        {
            return Err(malformed("node array lengths disagree".to_string()));
        }

        for i in 0..n {
            let left = tree.children_left[i];
            let right = tree.children_right[i];
            if left >= 0 {
                // Internal node
                if right < 0 {
                    return Err(malformed(format!("node {} has only one child", i)));
                }
                let (left, right) = (left as usize, right as usize);
                if left >= n || right >= n || left == i || right == i {
                    return Err(malformed(format!("node {} has out-of-range children", i)));
                }
                let feature = tree.feature[i];
                if feature < 0 || feature as usize >= FEATURE_COUNT {
                    return Err(malformed(format!(
                        "node {} splits on unknown feature index {}",
                        i, feature
                    )));
                }
                if !tree.threshold[i].is_finite() {
                    return Err(malformed(format!("node {} has a non-finite threshold", i)));
                }
            } else if right >= 0 {
                return Err(malformed(format!("node {} has only one child", i)));
            } else {
                // Leaf node
                let [neg, pos] = tree.value[i];
                if neg < 0.0 || pos < 0.0 || neg + pos <= 0.0 {
                    return Err(malformed(format!("leaf {} has invalid class counts", i)));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(feature: i32, threshold: f64, left: [f64; 2], right: [f64; 2]) -> DecisionTree {
        DecisionTree {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![feature, -2, -2],
            threshold: vec![threshold, 0.0, 0.0],
            value: vec![[0.0, 0.0], left, right],
        }
    }

    fn minimal_artifact() -> ModelArtifact {
        ModelArtifact {
            format_version: SUPPORTED_FORMAT_VERSION,
            model_version: "test".to_string(),
            trained_at: Utc::now(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            threshold: 0.5,
            trees: vec![stump(1, 127.5, [80.0, 20.0], [15.0, 45.0])],
        }
    }

    #[test]
    fn test_valid_artifact_passes() {
        assert!(minimal_artifact().validate().is_ok());
    }

    #[test]
    fn test_schema_order_mismatch_rejected() {
        let mut artifact = minimal_artifact();
        artifact.feature_names.swap(0, 1);
        let err = artifact.validate().unwrap_err();
        assert!(err.to_string().contains("schema mismatch"));
    }

    #[test]
    fn test_unknown_format_version_rejected() {
        let mut artifact = minimal_artifact();
        artifact.format_version = 99;
        assert!(artifact.validate().is_err());
    }

    #[test]
    fn test_empty_forest_rejected() {
        let mut artifact = minimal_artifact();
        artifact.trees.clear();
        assert!(artifact.validate().is_err());
    }

    #[test]
    fn test_out_of_range_child_rejected() {
        let mut artifact = minimal_artifact();
        artifact.trees[0].children_right[0] = 9;
        assert!(artifact.validate().is_err());
    }

    #[test]
    fn test_invalid_leaf_counts_rejected() {
        let mut artifact = minimal_artifact();
        artifact.trees[0].value[1] = [0.0, 0.0];
        assert!(artifact.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_is_model_unavailable() {
        let err = ModelArtifact::load("does/not/exist.json").unwrap_err();
        assert_eq!(err.error_code(), "MODEL_UNAVAILABLE");
    }
}

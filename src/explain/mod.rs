//! Per-feature attribution and global importance for the risk classifier.
//!
//! Attribution is exact single-baseline Shapley: with eight features all
//! 2^8 coalitions are enumerable, so each feature's additive contribution
//! relative to the reference-dataset mean record is computed exactly
//! rather than sampled. Global importance is permutation importance with a
//! fixed-seed shuffle.
//!
//! This is a secondary, explanatory feature: it shares the classifier with
//! the prediction path but failures here never affect prediction or
//! history.

use crate::error::{AppError, Result};
use crate::ml::classifier::RiskClassifier;
use crate::ml::dataset::ReferenceDataset;
use crate::ml::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Arc;

/// Seed for the permutation shuffle, pinned for reproducible reports
const PERMUTATION_SEED: u64 = 42;

/// One feature's additive contribution to a prediction
#[derive(Debug, Clone, Serialize)]
pub struct Attribution {
    pub feature: String,
    pub value: f64,
    pub attribution: f64,
}

/// Full attribution breakdown for one prediction:
/// prediction = base_value + sum of attributions
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub base_value: f64,
    pub prediction: f64,
    pub attributions: Vec<Attribution>,
}

/// Global importance of one feature (mean accuracy drop when shuffled)
#[derive(Debug, Clone, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Computes attributions and importance against a background dataset,
/// using the same classifier instance as the prediction path.
pub struct ExplanationEngine {
    classifier: Arc<RiskClassifier>,
    dataset: Arc<ReferenceDataset>,
    baseline: [f64; FEATURE_COUNT],
}

impl ExplanationEngine {
    pub fn new(classifier: Arc<RiskClassifier>, dataset: Arc<ReferenceDataset>) -> Self {
        let baseline = dataset.feature_means();
        Self {
            classifier,
            dataset,
            baseline,
        }
    }

    /// Exact Shapley attributions for one feature vector against the mean
    /// baseline, ranked by absolute contribution.
    pub fn explain(&self, vector: &FeatureVector) -> Result<Explanation> {
        let x = vector.values();
        let n_coalitions = 1usize << FEATURE_COUNT;

        // Model output for every coalition: bit i set means feature i
        // takes its submitted value, otherwise the baseline value.
        let mut outputs = vec![0.0; n_coalitions];
        for (mask, output) in outputs.iter_mut().enumerate() {
            let mut z = self.baseline;
            for (i, z_i) in z.iter_mut().enumerate() {
                if mask & (1 << i) != 0 {
                    *z_i = x[i];
                }
            }
            *output = self
                .classifier
                .predict_proba(&FeatureVector::from_values(z))
                .map_err(|e| AppError::Internal(format!("attribution failed: {}", e)))?;
        }

        let weights = coalition_weights();
        let mut attributions: Vec<Attribution> = Vec::with_capacity(FEATURE_COUNT);
        for i in 0..FEATURE_COUNT {
            let bit = 1usize << i;
            let mut phi = 0.0;
            for mask in 0..n_coalitions {
                if mask & bit != 0 {
                    continue;
                }
                let size = mask.count_ones() as usize;
                phi += weights[size] * (outputs[mask | bit] - outputs[mask]);
            }
            attributions.push(Attribution {
                feature: FEATURE_NAMES[i].to_string(),
                value: x[i],
                attribution: phi,
            });
        }

        attributions.sort_by(|a, b| {
            b.attribution
                .abs()
                .partial_cmp(&a.attribution.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(Explanation {
            base_value: outputs[0],
            prediction: outputs[n_coalitions - 1],
            attributions,
        })
    }

    /// Mean accuracy drop per feature when its column is shuffled across
    /// the reference dataset, ranked most important first. The shuffle is
    /// seeded, so repeated reports agree.
    pub fn permutation_importance(&self, n_repeats: usize) -> Result<Vec<FeatureImportance>> {
        if n_repeats == 0 {
            return Err(AppError::validation("n_repeats", "must be at least 1"));
        }

        let n_samples = self.dataset.n_samples();
        let baseline_accuracy = self.dataset_accuracy(None, &[])?;
        let mut rng = SmallRng::seed_from_u64(PERMUTATION_SEED);

        let mut importances: Vec<FeatureImportance> = Vec::with_capacity(FEATURE_COUNT);
        for (col, name) in FEATURE_NAMES.iter().enumerate() {
            let mut total_drop = 0.0;
            for _ in 0..n_repeats {
                let mut order: Vec<usize> = (0..n_samples).collect();
                order.shuffle(&mut rng);
                let accuracy = self.dataset_accuracy(Some(col), &order)?;
                total_drop += baseline_accuracy - accuracy;
            }
            importances.push(FeatureImportance {
                feature: name.to_string(),
                importance: total_drop / n_repeats as f64,
            });
        }

        importances.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(importances)
    }

    /// Accuracy over the reference dataset, optionally with one column
    /// read through a permuted row order.
    fn dataset_accuracy(&self, shuffled_col: Option<usize>, order: &[usize]) -> Result<f64> {
        let n_samples = self.dataset.n_samples();
        let mut correct = 0usize;

        for idx in 0..n_samples {
            let mut values = [0.0; FEATURE_COUNT];
            for (col, value) in values.iter_mut().enumerate() {
                let source_row = match shuffled_col {
                    Some(c) if c == col => order[idx],
                    _ => idx,
                };
                *value = self.dataset.row(source_row)[col];
            }
            let predicted = self
                .classifier
                .predict(&FeatureVector::from_values(values))?;
            if predicted == self.dataset.outcomes()[idx] {
                correct += 1;
            }
        }

        Ok(correct as f64 / n_samples as f64)
    }
}

/// Shapley coalition weights by coalition size: |S|! (n-|S|-1)! / n!
fn coalition_weights() -> [f64; FEATURE_COUNT] {
    let mut factorial = [1.0f64; FEATURE_COUNT + 1];
    for i in 1..=FEATURE_COUNT {
        factorial[i] = factorial[i - 1] * i as f64;
    }
    let mut weights = [0.0; FEATURE_COUNT];
    for (size, weight) in weights.iter_mut().enumerate() {
        *weight = factorial[size] * factorial[FEATURE_COUNT - size - 1] / factorial[FEATURE_COUNT];
    }
    weights
}

use crate::error::Result;
use crate::ml::classifier::RiskClassifier;
use crate::ml::dataset::ReferenceDataset;
use crate::ml::features::{FeatureVector, FEATURE_COUNT};
use serde::Serialize;

/// Per-class quality metrics
#[derive(Debug, Clone, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Model quality over the reference dataset
#[derive(Debug, Clone, Serialize)]
pub struct ModelPerformance {
    pub accuracy: f64,

    /// Rows = actual class, columns = predicted class; index 0 = negative
    pub confusion_matrix: [[usize; 2]; 2],

    pub negative: ClassMetrics,
    pub positive: ClassMetrics,
    pub n_samples: usize,
}

/// Evaluate the classifier against every labelled reference record
pub fn evaluate(
    classifier: &RiskClassifier,
    dataset: &ReferenceDataset,
) -> Result<ModelPerformance> {
    let mut confusion = [[0usize; 2]; 2];

    for idx in 0..dataset.n_samples() {
        let mut values = [0.0; FEATURE_COUNT];
        for (col, value) in values.iter_mut().enumerate() {
            *value = dataset.row(idx)[col];
        }
        let predicted = classifier.predict(&FeatureVector::from_values(values))?;
        let actual = dataset.outcomes()[idx];
        confusion[actual as usize][predicted as usize] += 1;
    }

    let n_samples = dataset.n_samples();
    let correct = confusion[0][0] + confusion[1][1];
    let accuracy = correct as f64 / n_samples as f64;

    Ok(ModelPerformance {
        accuracy,
        confusion_matrix: confusion,
        negative: class_metrics(&confusion, 0),
        positive: class_metrics(&confusion, 1),
        n_samples,
    })
}

fn class_metrics(confusion: &[[usize; 2]; 2], class: usize) -> ClassMetrics {
    let other = 1 - class;
    let tp = confusion[class][class];
    let fp = confusion[other][class];
    let fn_count = confusion[class][other];
    let support = confusion[class][0] + confusion[class][1];

    let precision = if tp + fp > 0 {
        tp as f64 / (tp + fp) as f64
    } else {
        0.0
    };
    let recall = if tp + fn_count > 0 {
        tp as f64 / (tp + fn_count) as f64
    } else {
        0.0
    };
    let f1_score = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    ClassMetrics {
        precision,
        recall,
        f1_score,
        support,
    }
}

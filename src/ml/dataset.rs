use crate::error::{AppError, Result};
use crate::ml::features::{FEATURE_COUNT, FEATURE_NAMES};
use ndarray::{Array2, ArrayView1};
use std::path::Path;

/// Labelled historical records backing the explanation and performance
/// features: the eight features plus an `Outcome` column. Loaded once at
/// startup and shared read-only; absence disables those features only,
/// never the prediction path.
#[derive(Debug)]
pub struct ReferenceDataset {
    features: Array2<f64>,
    outcomes: Vec<u8>,
}

impl ReferenceDataset {
    /// Load from CSV. The header must carry the canonical feature names in
    /// canonical order followed by `Outcome`; anything else is rejected so
    /// a reordered export can never silently skew attributions.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path).map_err(|e| {
            AppError::Dataset(format!(
                "cannot open reference dataset at {}: {}",
                path.display(),
                e
            ))
        })?;

        let headers = reader
            .headers()
            .map_err(|e| AppError::Dataset(format!("cannot read header row: {}", e)))?
            .clone();

        if headers.len() != FEATURE_COUNT + 1 {
            return Err(AppError::Dataset(format!(
                "expected {} columns, found {}",
                FEATURE_COUNT + 1,
                headers.len()
            )));
        }
        for (idx, expected) in FEATURE_NAMES.iter().enumerate() {
            if &headers[idx] != *expected {
                return Err(AppError::Dataset(format!(
                    "column {} is '{}', expected '{}'",
                    idx, &headers[idx], expected
                )));
            }
        }
        if &headers[FEATURE_COUNT] != "Outcome" {
            return Err(AppError::Dataset(format!(
                "last column is '{}', expected 'Outcome'",
                &headers[FEATURE_COUNT]
            )));
        }

        let mut values: Vec<f64> = Vec::new();
        let mut outcomes: Vec<u8> = Vec::new();

        for (row_idx, record) in reader.records().enumerate() {
            let record =
                record.map_err(|e| AppError::Dataset(format!("row {}: {}", row_idx + 1, e)))?;
            for col in 0..FEATURE_COUNT {
                let parsed: f64 = record[col].trim().parse().map_err(|_| {
                    AppError::Dataset(format!(
                        "row {}: column '{}' is not numeric: '{}'",
                        row_idx + 1,
                        FEATURE_NAMES[col],
                        &record[col]
                    ))
                })?;
                values.push(parsed);
            }
            let outcome: u8 = record[FEATURE_COUNT].trim().parse().map_err(|_| {
                AppError::Dataset(format!(
                    "row {}: Outcome is not 0/1: '{}'",
                    row_idx + 1,
                    &record[FEATURE_COUNT]
                ))
            })?;
            if outcome > 1 {
                return Err(AppError::Dataset(format!(
                    "row {}: Outcome must be 0 or 1, got {}",
                    row_idx + 1,
                    outcome
                )));
            }
            outcomes.push(outcome);
        }

        if outcomes.is_empty() {
            return Err(AppError::Dataset("reference dataset is empty".to_string()));
        }

        let n_samples = outcomes.len();
        let features = Array2::from_shape_vec((n_samples, FEATURE_COUNT), values)
            .map_err(|e| AppError::Dataset(format!("cannot shape feature matrix: {}", e)))?;

        tracing::info!(
            path = %path.display(),
            n_samples,
            "Reference dataset loaded"
        );

        Ok(ReferenceDataset { features, outcomes })
    }

    pub fn n_samples(&self) -> usize {
        self.outcomes.len()
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn outcomes(&self) -> &[u8] {
        &self.outcomes
    }

    pub fn row(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.features.row(idx)
    }

    /// Column means, used as the explanation baseline
    pub fn feature_means(&self) -> [f64; FEATURE_COUNT] {
        let n = self.n_samples() as f64;
        let mut means = [0.0; FEATURE_COUNT];
        for (col, mean) in means.iter_mut().enumerate() {
            *mean = self.features.column(col).sum() / n;
        }
        means
    }
}

use crate::error::Result;
use crate::ml::classifier::RiskClassifier;
use crate::ml::features::FeatureVectorBuilder;
use crate::models::{
    round_percent, MedicalInput, PersistenceStatus, PredictionReport, PredictionResult, RiskLabel,
    UserId,
};
use crate::state::HistoryStore;
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{debug, error};

/// The prediction pipeline: validate and assemble the feature vector, run
/// the classifier, derive the rounded risk percentage and label, stamp the
/// result in the configured zone, and append it to the user's history.
pub struct PredictionService {
    classifier: Arc<RiskClassifier>,
    store: Arc<dyn HistoryStore>,
    time_zone: Tz,
}

impl PredictionService {
    pub fn new(classifier: Arc<RiskClassifier>, store: Arc<dyn HistoryStore>, time_zone: Tz) -> Self {
        Self {
            classifier,
            store,
            time_zone,
        }
    }

    /// Run one prediction for one user.
    ///
    /// Validation failures propagate before any inference. Classifier
    /// failures surface as `Prediction` and are never retried. A history
    /// write failure does not discard the computed result: it is reported
    /// in the returned `persistence` status so the caller can tell the
    /// user the prediction succeeded but was not saved.
    pub async fn predict(&self, input: &MedicalInput, user: &UserId) -> Result<PredictionReport> {
        let vector = FeatureVectorBuilder::build(input)?;

        let probability = self.classifier.predict_proba(&vector)?;
        let label_code = self.classifier.predict(&vector)?;

        let risk_percent = round_percent(probability * 100.0);
        let label = RiskLabel::from_code(label_code);

        let result = PredictionResult {
            user: user.clone(),
            input: *input,
            probability,
            risk_percent,
            label,
            model_version: self.classifier.model_version().to_string(),
            created_at: chrono::Utc::now().with_timezone(&self.time_zone),
        };

        debug!(
            user = %user,
            risk_percent,
            label = %label,
            "Prediction computed"
        );

        let persistence = match self.store.append(&result).await {
            Ok(()) => PersistenceStatus::Saved,
            Err(e) => {
                error!(user = %user, error = %e, "Failed to persist prediction");
                PersistenceStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };

        Ok(PredictionReport { result, persistence })
    }

    pub fn classifier(&self) -> &Arc<RiskClassifier> {
        &self.classifier
    }
}

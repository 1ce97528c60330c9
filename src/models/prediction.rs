use crate::models::{MedicalInput, UserId};
use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary outcome of a risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    Positive,
    Negative,
}

impl RiskLabel {
    /// Map a classifier label code to a risk label. Code 1 always means
    /// Positive; any other code means Negative.
    pub fn from_code(code: u8) -> Self {
        if code == 1 {
            RiskLabel::Positive
        } else {
            RiskLabel::Negative
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::Positive => "Positive",
            RiskLabel::Negative => "Negative",
        }
    }

    /// User-facing message for this label. Total: every label maps to
    /// exactly one message.
    pub fn message(&self) -> &'static str {
        match self {
            RiskLabel::Positive => "You may have diabetes.",
            RiskLabel::Negative => "You are unlikely to have diabetes.",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Round a percentage to two decimals
pub fn round_percent(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One completed risk prediction. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    /// Owning user
    pub user: UserId,

    /// The raw submitted inputs
    pub input: MedicalInput,

    /// P(positive) reported by the classifier
    pub probability: f64,

    /// probability x 100, rounded to two decimals
    pub risk_percent: f64,

    /// Predicted label
    pub label: RiskLabel,

    /// Version of the classifier artifact that produced this result
    pub model_version: String,

    /// Creation time in the deployment's configured time zone
    pub created_at: DateTime<Tz>,
}

/// Durable per-user representation of a prediction: the raw inputs
/// denormalized next to the outcome, exactly as displayed and exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub pregnancies: u32,
    pub glucose: u32,
    pub blood_pressure: u32,
    pub skin_thickness: u32,
    pub insulin: u32,
    pub bmi: f64,
    pub diabetes_pedigree_function: f64,
    pub age: u32,
    pub risk_percent: f64,
    pub prediction: RiskLabel,
    pub timestamp: String,
}

impl From<&PredictionResult> for HistoryRecord {
    fn from(result: &PredictionResult) -> Self {
        let input = &result.input;
        HistoryRecord {
            pregnancies: input.pregnancies,
            glucose: input.glucose,
            blood_pressure: input.blood_pressure,
            skin_thickness: input.skin_thickness,
            insulin: input.insulin,
            bmi: input.bmi,
            diabetes_pedigree_function: input.diabetes_pedigree_function,
            age: input.age,
            risk_percent: result.risk_percent,
            prediction: result.label,
            timestamp: result.created_at.to_rfc3339(),
        }
    }
}

/// Whether a prediction result reached durable storage
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PersistenceStatus {
    Saved,
    Failed { reason: String },
}

/// Outcome of a prediction request: the computed result plus the fate of
/// its history append. A failed save never discards the result; the caller
/// must be able to tell the user the prediction succeeded but was not saved.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub result: PredictionResult,
    pub persistence: PersistenceStatus,
}

impl PredictionReport {
    pub fn is_saved(&self) -> bool {
        matches!(self.persistence, PersistenceStatus::Saved)
    }
}

pub mod handlers;
pub mod routes;

pub use routes::build_router;

use crate::advice::AdviceGenerator;
use crate::explain::ExplanationEngine;
use crate::ml::{PredictionService, ReferenceDataset, RiskClassifier};
use crate::state::HistoryStore;
use crate::trackers::{MealLog, SugarLog};
use chrono_tz::Tz;
use std::sync::Arc;

/// Shared application state for HTTP handlers.
///
/// The classifier-dependent services are optional: when the artifact or
/// the reference dataset failed to load at startup the service still runs,
/// and the affected endpoints report the feature as unavailable instead of
/// the whole process crashing.
#[derive(Clone)]
pub struct AppState {
    pub prediction: Option<Arc<PredictionService>>,
    pub classifier: Option<Arc<RiskClassifier>>,
    pub explanation: Option<Arc<ExplanationEngine>>,
    pub dataset: Option<Arc<ReferenceDataset>>,
    pub history: Arc<dyn HistoryStore>,
    pub meals: Arc<MealLog>,
    pub sugar: Arc<SugarLog>,
    pub advice: Arc<dyn AdviceGenerator>,
    pub time_zone: Tz,
}

use crate::error::{AppError, Result};
use crate::models::UserId;
use crate::trackers::log_store::JsonLogStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Glycemic target range (mg/dL) used for the in-range statistic
const TARGET_RANGE_MG_DL: (f64, f64) = (70.0, 180.0);

/// Physiologically plausible bounds for a meter reading
const READING_BOUNDS_MG_DL: (f64, f64) = (20.0, 600.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingContext {
    Fasting,
    BeforeMeal,
    AfterMeal,
    Bedtime,
}

/// One blood-sugar meter reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SugarReading {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level_mg_dl: f64,
    pub context: ReadingContext,
    #[serde(default)]
    pub note: Option<String>,
}

/// Fields supplied by the caller when logging a reading
#[derive(Debug, Clone, Deserialize)]
pub struct NewReading {
    pub level_mg_dl: f64,
    pub context: ReadingContext,
    #[serde(default)]
    pub note: Option<String>,
}

/// Aggregate statistics over a user's readings
#[derive(Debug, Clone, Serialize)]
pub struct SugarSummary {
    pub count: usize,
    pub mean_mg_dl: f64,
    pub min_mg_dl: f64,
    pub max_mg_dl: f64,
    /// Share of readings inside the 70-180 mg/dL target range, in percent
    pub in_range_percent: f64,
    /// HbA1c estimated from mean glucose (ADAG relation)
    pub estimated_hba1c: f64,
}

/// Per-user blood-sugar log
pub struct SugarLog {
    store: JsonLogStore<SugarReading>,
}

impl SugarLog {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        Ok(Self {
            store: JsonLogStore::new(root, "sugar")?,
        })
    }

    pub fn add(&self, user: &UserId, reading: NewReading) -> Result<SugarReading> {
        let (lo, hi) = READING_BOUNDS_MG_DL;
        if !(reading.level_mg_dl.is_finite()
            && reading.level_mg_dl >= lo
            && reading.level_mg_dl <= hi)
        {
            return Err(AppError::validation(
                "level_mg_dl",
                format!("reading must be between {} and {} mg/dL", lo, hi),
            ));
        }

        let entry = SugarReading {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level_mg_dl: reading.level_mg_dl,
            context: reading.context,
            note: reading.note,
        };
        self.store.append(user, entry.clone())?;
        tracing::debug!(user = %user, level = entry.level_mg_dl, "Sugar reading logged");
        Ok(entry)
    }

    /// All readings for one user, most recent first
    pub fn list(&self, user: &UserId) -> Result<Vec<SugarReading>> {
        let mut readings = self.store.load(user)?;
        readings.reverse();
        Ok(readings)
    }

    pub fn summary(&self, user: &UserId) -> Result<SugarSummary> {
        let readings = self.store.load(user)?;
        if readings.is_empty() {
            return Err(AppError::NotFound(format!(
                "no sugar readings recorded for {}",
                user
            )));
        }

        let count = readings.len();
        let levels: Vec<f64> = readings.iter().map(|r| r.level_mg_dl).collect();
        let mean = levels.iter().sum::<f64>() / count as f64;
        let min = levels.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = levels.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        let (lo, hi) = TARGET_RANGE_MG_DL;
        let in_range = levels.iter().filter(|&&l| l >= lo && l <= hi).count();

        Ok(SugarSummary {
            count,
            mean_mg_dl: mean,
            min_mg_dl: min,
            max_mg_dl: max,
            in_range_percent: in_range as f64 / count as f64 * 100.0,
            estimated_hba1c: (mean + 46.7) / 28.7,
        })
    }

    pub fn clear(&self, user: &UserId) -> Result<()> {
        self.store.clear(user)
    }
}

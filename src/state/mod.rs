pub mod csv_store;
pub mod factory;
pub mod memory;

pub use csv_store::CsvHistoryStore;
pub use factory::create_history_store;
pub use memory::InMemoryHistoryStore;

use crate::error::{AppError, Result};
use crate::models::{HistoryRecord, PredictionResult, UserId};
use async_trait::async_trait;

/// Trait for per-user prediction history storage. Backings are swappable
/// (local CSV files, in-memory); callers depend only on this contract.
///
/// Appends happen at most once per prediction, with no automatic retry
/// that could duplicate a row. Every read and write is scoped by the user
/// identifier; records of one user are never visible to another.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Durably persist one record for the owning user
    async fn append(&self, result: &PredictionResult) -> Result<()>;

    /// All records for one user, most recent first. A user with no
    /// history gets an empty list, not an error.
    async fn list(&self, user: &UserId) -> Result<Vec<HistoryRecord>>;

    /// Irreversibly delete all of this user's records; other users'
    /// records are untouched
    async fn clear(&self, user: &UserId) -> Result<()>;

    /// Serialize the current `list` output to UTF-8 CSV bytes, header row
    /// included, same order as displayed
    async fn export_csv(&self, user: &UserId) -> Result<Vec<u8>> {
        let records = self.list(user).await?;
        records_to_csv(&records)
    }
}

/// Render history records as CSV bytes with a header row
pub fn records_to_csv(records: &[HistoryRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| AppError::Persistence(format!("CSV serialization failed: {}", e)))?;
    }
    // An empty history still gets its header row
    if records.is_empty() {
        writer
            .write_record(HISTORY_CSV_HEADER)
            .map_err(|e| AppError::Persistence(format!("CSV serialization failed: {}", e)))?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Persistence(format!("CSV flush failed: {}", e)))
}

/// Column names of the history CSV, matching `HistoryRecord` field order
pub const HISTORY_CSV_HEADER: [&str; 11] = [
    "pregnancies",
    "glucose",
    "blood_pressure",
    "skin_thickness",
    "insulin",
    "bmi",
    "diabetes_pedigree_function",
    "age",
    "risk_percent",
    "prediction",
    "timestamp",
];

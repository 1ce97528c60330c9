use crate::error::{AppError, Result};
use crate::models::{HistoryRecord, PredictionResult, UserId};
use crate::state::HistoryStore;
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// History store backed by one CSV file per user under a fixed directory.
/// The file name is derived from a digest of the user identifier, so a
/// user's records live in exactly one file and no path component comes
/// from unsanitized input.
#[derive(Clone)]
pub struct CsvHistoryStore {
    root: PathBuf,
}

impl CsvHistoryStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|e| {
            AppError::Persistence(format!(
                "cannot create history directory {}: {}",
                root.display(),
                e
            ))
        })?;
        tracing::info!(path = %root.display(), "Initialized CSV history store");
        Ok(Self { root })
    }

    fn user_file(&self, user: &UserId) -> PathBuf {
        self.root.join(format!("history_{}.csv", user.storage_key()))
    }
}

#[async_trait]
impl HistoryStore for CsvHistoryStore {
    async fn append(&self, result: &PredictionResult) -> Result<()> {
        let record = HistoryRecord::from(result);
        let path = self.user_file(&result.user);
        let is_new = !path.exists();

        // Render header (first write only) and row into one buffer so the
        // record reaches the file in a single write call.
        let mut buf = Vec::new();
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(is_new)
                .from_writer(&mut buf);
            writer
                .serialize(&record)
                .map_err(|e| AppError::Persistence(format!("CSV serialization failed: {}", e)))?;
            writer
                .flush()
                .map_err(|e| AppError::Persistence(format!("CSV flush failed: {}", e)))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                AppError::Persistence(format!("cannot open {}: {}", path.display(), e))
            })?;
        file.write_all(&buf).map_err(|e| {
            AppError::Persistence(format!("cannot write to {}: {}", path.display(), e))
        })?;
        file.sync_all().map_err(|e| {
            AppError::Persistence(format!("cannot sync {}: {}", path.display(), e))
        })?;

        tracing::debug!(user = %result.user, path = %path.display(), "Prediction appended");
        Ok(())
    }

    async fn list(&self, user: &UserId) -> Result<Vec<HistoryRecord>> {
        let path = self.user_file(user);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&path).map_err(|e| {
            AppError::Persistence(format!("cannot read {}: {}", path.display(), e))
        })?;

        let mut records: Vec<HistoryRecord> = Vec::new();
        for row in reader.deserialize() {
            let record: HistoryRecord = row.map_err(|e| {
                AppError::Persistence(format!("corrupt row in {}: {}", path.display(), e))
            })?;
            records.push(record);
        }

        records.reverse(); // file is append order, serve most recent first
        Ok(records)
    }

    async fn clear(&self, user: &UserId) -> Result<()> {
        let path = self.user_file(user);
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| {
                AppError::Persistence(format!("cannot delete {}: {}", path.display(), e))
            })?;
            tracing::info!(user = %user, "History cleared");
        }
        Ok(())
    }
}

use crate::config::{HistoryBackend, HistoryConfig};
use crate::error::{AppError, Result};
use crate::state::{CsvHistoryStore, HistoryStore, InMemoryHistoryStore};
use std::sync::Arc;

/// Create a history store based on configuration
pub fn create_history_store(config: &HistoryConfig) -> Result<Arc<dyn HistoryStore>> {
    match config.backend {
        HistoryBackend::Csv => {
            let path = config.path.as_ref().ok_or_else(|| {
                AppError::Configuration(
                    "csv history backend requires 'path' configuration".to_string(),
                )
            })?;

            tracing::info!(path = ?path, "Initializing CSV history backend");
            let store = CsvHistoryStore::new(path)?;
            Ok(Arc::new(store))
        }

        HistoryBackend::Memory => {
            tracing::info!("Initializing in-memory history backend");
            Ok(Arc::new(InMemoryHistoryStore::new()))
        }
    }
}

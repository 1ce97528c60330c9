use crate::error::Result;
use crate::models::{HistoryRecord, PredictionResult, UserId};
use crate::state::HistoryStore;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory history store (for development and testing)
#[derive(Clone)]
pub struct InMemoryHistoryStore {
    records: Arc<DashMap<String, Vec<HistoryRecord>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, result: &PredictionResult) -> Result<()> {
        let record = HistoryRecord::from(result);
        self.records
            .entry(result.user.as_str().to_string())
            .or_default()
            .push(record);

        tracing::debug!(user = %result.user, "Prediction appended to in-memory history");
        Ok(())
    }

    async fn list(&self, user: &UserId) -> Result<Vec<HistoryRecord>> {
        let mut records = self
            .records
            .get(user.as_str())
            .map(|entry| entry.clone())
            .unwrap_or_default();
        records.reverse(); // stored in append order, served most recent first
        Ok(records)
    }

    async fn clear(&self, user: &UserId) -> Result<()> {
        self.records.remove(user.as_str());
        tracing::debug!(user = %user, "History cleared");
        Ok(())
    }
}

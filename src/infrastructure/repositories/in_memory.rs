//! In-memory `PredictionRepository`.
//!
//! Thread-safe through `Arc<RwLock>`; data is lost on restart. Used by tests
//! and by deployments that run with `ENABLE_PERSISTENCE=false` but still want
//! the read-back path during development.

use crate::domain::prediction::{PersistedRecord, StoredPrediction};
use crate::domain::repositories::PredictionRepository;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct InMemoryPredictionRepository {
    records: Arc<RwLock<Vec<PersistedRecord>>>,
}

impl InMemoryPredictionRepository {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn get_all(&self) -> Vec<PersistedRecord> {
        self.records.read().await.clone()
    }
}

impl Default for InMemoryPredictionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PredictionRepository for InMemoryPredictionRepository {
    async fn save(&self, record: &PersistedRecord) -> Result<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn find_recent_by_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredPrediction>> {
        let records = self.records.read().await;
        let mut matching: Vec<&PersistedRecord> = records
            .iter()
            .filter(|r| r.features().user_id() == Some(user_id))
            .collect();
        // Stable sort keeps insertion order for equal timestamps
        matching.sort_by_key(|r| std::cmp::Reverse(r.created_at()));
        Ok(matching
            .into_iter()
            .take(limit)
            .map(StoredPrediction::from)
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

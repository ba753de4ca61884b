//! Repository Pattern Abstractions
//!
//! Storage for prediction results sits behind `PredictionRepository` so the
//! orchestration layer never depends on a concrete database.
//!
//! # Implementations
//!
//! - `SqlitePredictionRepository`: pooled sqlx/SQLite store used in production
//! - `InMemoryPredictionRepository`: `Arc<RwLock>` backed store for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use cropwise::domain::repositories::PredictionRepository;
//! use cropwise::infrastructure::InMemoryPredictionRepository;
//!
//! # async {
//! let repo = InMemoryPredictionRepository::new();
//! // repo.save(&record).await?;
//! // let latest = repo.find_recent_by_user("farmer-7", 10).await?;
//! # };
//! ```

use crate::domain::prediction::{PersistedRecord, StoredPrediction};
use anyhow::Result;
use async_trait::async_trait;

/// Repository for persisting and reading back predictions
#[async_trait]
pub trait PredictionRepository: Send + Sync {
    /// Write one prediction. Records are never updated afterwards.
    async fn save(&self, record: &PersistedRecord) -> Result<()>;

    /// Most recent predictions for a user, newest first
    async fn find_recent_by_user(&self, user_id: &str, limit: usize)
    -> Result<Vec<StoredPrediction>>;

    /// Cheap connectivity check
    async fn ping(&self) -> Result<()>;
}

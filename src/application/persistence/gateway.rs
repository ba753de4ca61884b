use crate::domain::errors::StorageError;
use crate::domain::prediction::{PersistedRecord, StoredPrediction};
use crate::domain::repositories::PredictionRepository;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// What happened to the write for one prediction.
///
/// Storage problems never fail a request; they only change this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PersistenceOutcome {
    Persisted { id: String },
    NotPersisted { reason: String },
    /// Persistence switched off by configuration
    Disabled,
    /// Handed to a background task; the caller did not wait
    Pending { id: String },
}

impl PersistenceOutcome {
    /// Metric label
    pub fn label(&self) -> &'static str {
        match self {
            PersistenceOutcome::Persisted { .. } => "persisted",
            PersistenceOutcome::NotPersisted { .. } => "not_persisted",
            PersistenceOutcome::Disabled => "disabled",
            PersistenceOutcome::Pending { .. } => "pending",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, PersistenceOutcome::NotPersisted { .. })
    }

    pub fn prediction_id(&self) -> Option<&str> {
        match self {
            PersistenceOutcome::Persisted { id } | PersistenceOutcome::Pending { id } => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageStatus {
    Connected,
    Disabled,
    Unavailable,
}

async fn bounded_save(
    repository: &dyn PredictionRepository,
    record: &PersistedRecord,
    timeout: Duration,
) -> Result<(), StorageError> {
    match tokio::time::timeout(timeout, repository.save(record)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(StorageError::Backend(format!("{:#}", e))),
        Err(_) => Err(StorageError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

enum Backend {
    Active(Arc<dyn PredictionRepository>),
    /// Switched off by configuration
    Disabled,
    /// Enabled, but the store could not be reached at startup
    Unavailable,
}

/// Best-effort writer in front of a `PredictionRepository`.
///
/// Detached writes are tracked until they finish; call `drain` before the
/// runtime shuts down or they are lost.
pub struct PersistenceGateway {
    backend: Backend,
    timeout: Duration,
    detached: bool,
    pending: Mutex<JoinSet<()>>,
}

impl PersistenceGateway {
    pub fn new(
        repository: Arc<dyn PredictionRepository>,
        timeout: Duration,
        detached: bool,
    ) -> Self {
        Self {
            backend: Backend::Active(repository),
            timeout,
            detached,
            pending: Mutex::new(JoinSet::new()),
        }
    }

    /// A gateway that never writes. Every `store` reports `Disabled`.
    pub fn disabled() -> Self {
        Self {
            backend: Backend::Disabled,
            timeout: Duration::ZERO,
            detached: false,
            pending: Mutex::new(JoinSet::new()),
        }
    }

    /// Persistence was requested but the database failed to initialise.
    /// Every `store` reports `NotPersisted`.
    pub fn unavailable() -> Self {
        Self {
            backend: Backend::Unavailable,
            timeout: Duration::ZERO,
            detached: false,
            pending: Mutex::new(JoinSet::new()),
        }
    }

    fn repository(&self) -> Option<&Arc<dyn PredictionRepository>> {
        match &self.backend {
            Backend::Active(repository) => Some(repository),
            _ => None,
        }
    }

    pub async fn store(&self, record: PersistedRecord) -> PersistenceOutcome {
        let repository = match &self.backend {
            Backend::Active(repository) => repository,
            Backend::Disabled => return PersistenceOutcome::Disabled,
            Backend::Unavailable => {
                return PersistenceOutcome::NotPersisted {
                    reason: StorageError::Unavailable.to_string(),
                };
            }
        };

        let id = record.id().to_string();

        if self.detached {
            let repository = Arc::clone(repository);
            let timeout = self.timeout;
            let mut pending = self.pending.lock().await;
            // Reap finished writes so the set only holds live ones
            while pending.try_join_next().is_some() {}
            pending.spawn(async move {
                match bounded_save(repository.as_ref(), &record, timeout).await {
                    Ok(()) => debug!(prediction_id = record.id(), "Background write completed"),
                    Err(e) => {
                        warn!(prediction_id = record.id(), error = %e, "Background write failed")
                    }
                }
            });
            return PersistenceOutcome::Pending { id };
        }

        match bounded_save(repository.as_ref(), &record, self.timeout).await {
            Ok(()) => {
                info!(
                    prediction_id = %id,
                    crop = %record.features().crop_type(),
                    "Prediction persisted"
                );
                PersistenceOutcome::Persisted { id }
            }
            Err(e) => {
                warn!(prediction_id = %id, error = %e, "Prediction not persisted");
                PersistenceOutcome::NotPersisted {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Wait up to `limit` for detached writes still in flight. Returns how
    /// many were abandoned.
    pub async fn drain(&self, limit: Duration) -> usize {
        let mut pending = std::mem::take(&mut *self.pending.lock().await);
        if pending.is_empty() {
            return 0;
        }

        let in_flight = pending.len();
        let joined = tokio::time::timeout(limit, async {
            while let Some(result) = pending.join_next().await {
                if let Err(e) = result {
                    warn!(error = %e, "Background write task aborted");
                }
            }
        })
        .await;

        match joined {
            Ok(()) => {
                info!(writes = in_flight, "Background writes drained");
                0
            }
            Err(_) => {
                let abandoned = pending.len();
                warn!(
                    abandoned,
                    limit_ms = limit.as_millis() as u64,
                    "Gave up waiting for background writes"
                );
                pending.abort_all();
                abandoned
            }
        }
    }

    /// Latest predictions for `user_id`. Empty on any storage failure.
    pub async fn recent_for_user(&self, user_id: &str, limit: usize) -> Vec<StoredPrediction> {
        let Some(repository) = self.repository() else {
            return Vec::new();
        };

        let read = repository.find_recent_by_user(user_id, limit);
        match tokio::time::timeout(self.timeout, read).await {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => {
                warn!(user_id, error = %format!("{:#}", e), "Failed to read recent predictions");
                Vec::new()
            }
            Err(_) => {
                warn!(user_id, "Timed out reading recent predictions");
                Vec::new()
            }
        }
    }

    pub async fn status(&self) -> StorageStatus {
        let repository = match &self.backend {
            Backend::Active(repository) => repository,
            Backend::Disabled => return StorageStatus::Disabled,
            Backend::Unavailable => return StorageStatus::Unavailable,
        };

        match tokio::time::timeout(self.timeout, repository.ping()).await {
            Ok(Ok(())) => StorageStatus::Connected,
            Ok(Err(e)) => {
                warn!(error = %format!("{:#}", e), "Storage ping failed");
                StorageStatus::Unavailable
            }
            Err(_) => StorageStatus::Unavailable,
        }
    }
}

use std::sync::Arc;
use tracing::{info, warn};

use crate::application::persistence::PersistenceGateway;
use crate::config::PersistenceEnvConfig;
use crate::domain::repositories::PredictionRepository;
use crate::infrastructure::persistence::{Database, SqlitePredictionRepository};

pub struct PersistenceBootstrap;

impl PersistenceBootstrap {
    /// Never fails: an unreachable database leaves the gateway in the
    /// `unavailable` state and predictions are still served.
    pub async fn init(config: &PersistenceEnvConfig) -> PersistenceGateway {
        if !config.enabled {
            info!("Persistence disabled by configuration");
            return PersistenceGateway::disabled();
        }

        info!(
            pool_min = config.pool_min,
            pool_max = config.pool_max,
            timeout_ms = config.timeout_ms,
            async_writes = config.async_writes,
            "Initializing prediction database"
        );

        let connect = Database::new(&config.database_url, config.pool_settings());
        let db = match tokio::time::timeout(config.timeout(), connect).await {
            Ok(Ok(db)) => db,
            Ok(Err(e)) => {
                warn!(
                    error = %format!("{:#}", e),
                    "Database unavailable; predictions will not be persisted"
                );
                return PersistenceGateway::unavailable();
            }
            Err(_) => {
                warn!(
                    timeout_ms = config.timeout_ms,
                    "Database connection timed out; predictions will not be persisted"
                );
                return PersistenceGateway::unavailable();
            }
        };

        // The repository owns the pool from here on
        let repository: Arc<dyn PredictionRepository> =
            Arc::new(SqlitePredictionRepository::new(db.pool));

        PersistenceGateway::new(repository, config.timeout(), config.async_writes)
    }
}

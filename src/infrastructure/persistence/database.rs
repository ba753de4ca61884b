use anyhow::{Context, Result};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tokio::fs;
use tracing::info;

/// Connection pool bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolSettings {
    pub min_connections: u32,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            min_connections: 1,
            max_connections: 10,
            acquire_timeout: Duration::from_millis(3000),
        }
    }
}

/// Pooled SQLite handle. Cloning shares the pool.
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str, settings: PoolSettings) -> Result<Self> {
        // Ensure the directory exists if it's a file path
        if let Some(path_part) = db_url.strip_prefix("sqlite://") {
            let path = Path::new(path_part);
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        let options = SqliteConnectOptions::from_str(db_url)
            .context("Invalid DATABASE_URL")?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal); // Better for concurrency

        let pool = SqlitePoolOptions::new()
            .min_connections(settings.min_connections)
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        // Never log the full URL; it may carry credentials for other backends
        info!(
            min = settings.min_connections,
            max = settings.max_connections,
            "Connected to prediction database"
        );

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS yield_predictions (
                prediction_id TEXT PRIMARY KEY,
                user_id TEXT,
                crop_type TEXT NOT NULL,
                farm_area REAL NOT NULL,
                soil_type TEXT NOT NULL,
                soil_ph REAL NOT NULL,
                water_usage REAL NOT NULL,
                fertilizer REAL NOT NULL,
                temperature REAL NOT NULL,
                humidity REAL NOT NULL,
                predicted_yield REAL NOT NULL,
                confidence REAL NOT NULL,
                suitability TEXT NOT NULL,
                recommendations TEXT NOT NULL,
                profitability_data TEXT,
                yield_source TEXT NOT NULL,
                model_version TEXT,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create yield_predictions table")?;

        // Read-back path filters by user, newest first
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_yield_predictions_user_time
            ON yield_predictions (user_id, created_at);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create yield_predictions index")?;

        info!("Database schema initialized");
        Ok(())
    }
}

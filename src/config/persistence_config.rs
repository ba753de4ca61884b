//! Database configuration parsing from environment variables.

use super::{Lookup, parse_bool, parse_or};
use crate::infrastructure::persistence::PoolSettings;
use anyhow::Result;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct PersistenceEnvConfig {
    pub enabled: bool,
    pub database_url: String,
    pub pool_min: u32,
    pub pool_max: u32,
    /// Bound on pool acquisition and on every individual write
    pub timeout_ms: u64,
    /// Spawn writes instead of awaiting them
    pub async_writes: bool,
    /// How long shutdown waits for spawned writes
    pub drain_timeout_ms: u64,
}

impl Default for PersistenceEnvConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_url: "sqlite://data/cropwise.db".to_string(),
            pool_min: 1,
            pool_max: 10,
            timeout_ms: 3000,
            async_writes: false,
            drain_timeout_ms: 10_000,
        }
    }
}

impl PersistenceEnvConfig {
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            enabled: parse_bool(lookup, "ENABLE_PERSISTENCE", defaults.enabled)?,
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            pool_min: parse_or(lookup, "DB_POOL_MIN", defaults.pool_min)?,
            pool_max: parse_or(lookup, "DB_POOL_MAX", defaults.pool_max)?,
            timeout_ms: parse_or(lookup, "DB_TIMEOUT_MS", defaults.timeout_ms)?,
            async_writes: parse_bool(lookup, "PERSISTENCE_ASYNC", defaults.async_writes)?,
            drain_timeout_ms: parse_or(lookup, "DB_DRAIN_TIMEOUT_MS", defaults.drain_timeout_ms)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pool_max == 0 {
            anyhow::bail!("DB_POOL_MAX must be at least 1");
        }
        if self.pool_min > self.pool_max {
            anyhow::bail!(
                "DB_POOL_MIN ({}) must not exceed DB_POOL_MAX ({})",
                self.pool_min,
                self.pool_max
            );
        }
        if self.timeout_ms == 0 {
            anyhow::bail!("DB_TIMEOUT_MS must be greater than 0");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            min_connections: self.pool_min,
            max_connections: self.pool_max,
            acquire_timeout: self.timeout(),
        }
    }
}

//! Configuration module for cropwise.
//!
//! Settings come from environment variables (after `dotenvy` has loaded any
//! `.env` file), organized by domain: Models, Persistence and Pricing. Every
//! loader takes a lookup function so tests can feed a map instead of
//! mutating the process environment.

mod model_config;
mod persistence_config;
mod pricing_config;

pub use model_config::ModelEnvConfig;
pub use persistence_config::PersistenceEnvConfig;
pub use pricing_config::PricingEnvConfig;

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::env;
use std::str::FromStr;

/// Source of raw setting values, keyed by variable name
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

pub(crate) fn parse_or<T>(lookup: Lookup<'_>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Failed to parse {}={:?}", key, raw)),
        None => Ok(default),
    }
}

/// Accepts true/false, 1/0, yes/no, on/off in any case.
pub(crate) fn parse_bool(lookup: Lookup<'_>, key: &str, default: bool) -> Result<bool> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("Failed to parse {}={:?}: expected a boolean", key, raw),
    }
}

/// Main application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub models: ModelEnvConfig,
    pub persistence: PersistenceEnvConfig,
    pub pricing: PricingEnvConfig,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key| env::var(key).ok())
    }

    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self> {
        Self::from_lookup(&|key| vars.get(key).cloned())
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        let models = ModelEnvConfig::from_lookup(lookup).context("Failed to load model config")?;
        let persistence = PersistenceEnvConfig::from_lookup(lookup)
            .context("Failed to load persistence config")?;
        let pricing =
            PricingEnvConfig::from_lookup(lookup).context("Failed to load pricing config")?;

        Ok(Self {
            models,
            persistence,
            pricing,
        })
    }
}

//! Profitability configuration parsing from environment variables.

use super::{Lookup, parse_bool};
use crate::domain::agronomy::PricingTable;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct PricingEnvConfig {
    pub enabled: bool,
    /// JSON price table replacing the built-in one
    pub table_path: Option<PathBuf>,
}

impl Default for PricingEnvConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            table_path: None,
        }
    }
}

impl PricingEnvConfig {
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        Ok(Self {
            enabled: parse_bool(lookup, "ENABLE_PROFITABILITY", true)?,
            table_path: lookup("PRICING_TABLE_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        })
    }

    /// `None` when profitability is switched off. A configured file that
    /// cannot be read or parsed is an error, not a silent fallback.
    pub fn load_table(&self) -> Result<Option<PricingTable>> {
        if !self.enabled {
            info!("Profitability disabled by configuration");
            return Ok(None);
        }

        match &self.table_path {
            Some(path) => {
                let table = PricingTable::from_json_file(path)
                    .with_context(|| format!("Failed to load pricing table {:?}", path))?;
                info!(crops = table.len(), "Loaded pricing table from {:?}", path);
                Ok(Some(table))
            }
            None => Ok(Some(PricingTable::builtin())),
        }
    }
}

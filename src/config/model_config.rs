//! Model artifact configuration parsing from environment variables.

use super::{Lookup, parse_bool};
use crate::application::ml::ModelPaths;
use anyhow::Result;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct ModelEnvConfig {
    pub models_dir: PathBuf,
    pub suitability_enabled: bool,
    pub yield_enabled: bool,
}

impl Default for ModelEnvConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("models"),
            suitability_enabled: true,
            yield_enabled: true,
        }
    }
}

impl ModelEnvConfig {
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            models_dir: lookup("MODELS_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.models_dir),
            suitability_enabled: parse_bool(
                lookup,
                "ENABLE_SUITABILITY_MODEL",
                defaults.suitability_enabled,
            )?,
            yield_enabled: parse_bool(lookup, "ENABLE_YIELD_MODEL", defaults.yield_enabled)?,
        })
    }

    pub fn paths(&self) -> ModelPaths {
        ModelPaths {
            dir: self.models_dir.clone(),
            suitability_enabled: self.suitability_enabled,
            yield_enabled: self.yield_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_dir_falls_back_to_default() {
        let config = ModelEnvConfig::from_lookup(&|key| {
            (key == "MODELS_DIR").then(|| "  ".to_string())
        })
        .unwrap();
        assert_eq!(config.models_dir, PathBuf::from("models"));
    }

    #[test]
    fn test_paths_carry_flags() {
        let config = ModelEnvConfig {
            suitability_enabled: false,
            ..ModelEnvConfig::default()
        };
        let paths = config.paths();
        assert!(!paths.suitability_enabled);
        assert!(paths.yield_enabled);
        assert_eq!(paths.artifact("metadata.json"), PathBuf::from("models/metadata.json"));
    }
}

//! Wires configuration into a ready `PredictionService`.
//!
//! Order matters: models first (fatal on failure), then pricing (fatal if a
//! configured file is broken), then storage (never fatal).

pub mod persistence;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::application::ml::{ModelRegistry, RegistryHandle};
use crate::application::prediction::PredictionOrchestrator;
use crate::application::service::PredictionService;
use crate::config::Config;
use crate::infrastructure::observability::Metrics;
pub use persistence::PersistenceBootstrap;

pub struct Application;

impl Application {
    pub async fn build(config: &Config) -> Result<PredictionService> {
        let paths = config.models.paths();
        let registry = ModelRegistry::load(&paths).context("Failed to load prediction models")?;
        let registry = Arc::new(RegistryHandle::new(registry));

        let pricing = config.pricing.load_table()?;
        let orchestrator = PredictionOrchestrator::new(registry, pricing);

        let gateway = PersistenceBootstrap::init(&config.persistence).await;
        let metrics = Metrics::new().context("Failed to register metrics")?;

        info!("Prediction service ready");
        Ok(PredictionService::new(orchestrator, gateway, metrics).with_model_paths(paths))
    }
}

use super::metadata::ModelMetadata;
use super::predictor::{SuitabilityEstimator, YieldEstimator};
use super::smartcore_predictor::{SmartCoreSuitabilityModel, SmartCoreYieldModel};
use crate::domain::errors::{ModelError, ModelLoadError};
use crate::domain::features::FeatureRecord;
use crate::domain::prediction::{ModelKind, SuitabilityLabel};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

pub const SUITABILITY_ARTIFACT: &str = "suitability_model.json";
pub const YIELD_ARTIFACT: &str = "yield_model.json";
pub const METADATA_ARTIFACT: &str = "metadata.json";

/// Where the artifacts live and which model kinds are switched on.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPaths {
    pub dir: PathBuf,
    pub suitability_enabled: bool,
    pub yield_enabled: bool,
}

impl ModelPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            suitability_enabled: true,
            yield_enabled: true,
        }
    }

    pub fn artifact(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

fn read_artifact(path: &Path, artifact: &str) -> Result<Vec<u8>, ModelLoadError> {
    if !path.exists() {
        return Err(ModelLoadError::MissingArtifact {
            artifact: artifact.to_string(),
            path: path.to_path_buf(),
        });
    }
    std::fs::read(path).map_err(|source| ModelLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Loaded inference pipelines plus their descriptor.
///
/// Immutable after construction: concurrent predictions share it through an
/// `Arc` without any locking. Replacing models goes through `RegistryHandle`.
pub struct ModelRegistry {
    metadata: Option<ModelMetadata>,
    suitability: Option<Box<dyn SuitabilityEstimator>>,
    yield_model: Option<Box<dyn YieldEstimator>>,
}

impl ModelRegistry {
    /// Reads every enabled artifact from `paths.dir`.
    ///
    /// Fails fast: a missing, corrupt or tampered artifact, or a descriptor
    /// whose feature schema differs from `FEATURE_NAMES`, aborts the load.
    pub fn load(paths: &ModelPaths) -> Result<Self, ModelLoadError> {
        if !paths.suitability_enabled && !paths.yield_enabled {
            warn!("All model kinds disabled. Serving fallback heuristics only.");
            return Ok(Self::fallback_only());
        }

        let metadata_path = paths.artifact(METADATA_ARTIFACT);
        let raw = read_artifact(&metadata_path, "metadata")?;
        let metadata: ModelMetadata =
            serde_json::from_slice(&raw).map_err(|e| ModelLoadError::Corrupt {
                path: metadata_path.clone(),
                reason: e.to_string(),
            })?;
        metadata.check_schema()?;

        let suitability: Option<Box<dyn SuitabilityEstimator>> = if paths.suitability_enabled {
            let path = paths.artifact(SUITABILITY_ARTIFACT);
            let bytes = read_artifact(&path, "suitability")?;
            metadata.verify_checksum(SUITABILITY_ARTIFACT, &bytes)?;
            Some(Box::new(SmartCoreSuitabilityModel::from_json_bytes(
                &path, &bytes,
            )?))
        } else {
            info!("Suitability model disabled by configuration");
            None
        };

        let yield_model: Option<Box<dyn YieldEstimator>> = if paths.yield_enabled {
            let path = paths.artifact(YIELD_ARTIFACT);
            let bytes = read_artifact(&path, "yield")?;
            metadata.verify_checksum(YIELD_ARTIFACT, &bytes)?;
            Some(Box::new(SmartCoreYieldModel::from_json_bytes(
                &path,
                &bytes,
                metadata.yield_confidence(),
            )?))
        } else {
            info!("Yield model disabled by configuration");
            None
        };

        info!(
            version = %metadata.version,
            training_date = %metadata.training_date,
            suitability = suitability.is_some(),
            yield_model = yield_model.is_some(),
            "Loaded models from {:?}",
            paths.dir
        );

        Ok(Self {
            metadata: Some(metadata),
            suitability,
            yield_model,
        })
    }

    /// A registry with no models: every prediction takes the fallback path.
    pub fn fallback_only() -> Self {
        Self {
            metadata: None,
            suitability: None,
            yield_model: None,
        }
    }

    /// Assemble a registry from already-built estimators.
    pub fn from_parts(
        metadata: Option<ModelMetadata>,
        suitability: Option<Box<dyn SuitabilityEstimator>>,
        yield_model: Option<Box<dyn YieldEstimator>>,
    ) -> Self {
        Self {
            metadata,
            suitability,
            yield_model,
        }
    }

    pub fn available(&self, kind: ModelKind) -> bool {
        match kind {
            ModelKind::Suitability => self.suitability.is_some(),
            ModelKind::Yield => self.yield_model.is_some(),
        }
    }

    /// `(tonnes, confidence)` from the trained yield model.
    pub fn predict_yield(&self, record: &FeatureRecord) -> Result<(f64, f64), ModelError> {
        let model = self.yield_estimator().ok_or(ModelError::Unavailable {
            kind: ModelKind::Yield,
        })?;
        let estimate = model.estimate(record)?;
        Ok((estimate.tonnes, estimate.confidence))
    }

    pub fn predict_suitability(
        &self,
        record: &FeatureRecord,
    ) -> Result<SuitabilityLabel, ModelError> {
        self.suitability_estimator()
            .ok_or(ModelError::Unavailable {
                kind: ModelKind::Suitability,
            })?
            .classify(record)
    }

    pub fn yield_estimator(&self) -> Option<&dyn YieldEstimator> {
        self.yield_model.as_deref()
    }

    pub fn suitability_estimator(&self) -> Option<&dyn SuitabilityEstimator> {
        self.suitability.as_deref()
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.metadata.as_ref()
    }

    pub fn version(&self) -> Option<&str> {
        self.metadata.as_ref().map(|m| m.version.as_str())
    }
}

/// Shared pointer to the live registry.
///
/// Readers take an `Arc` snapshot and predict without holding the lock; the
/// write lock is only taken to swap in a freshly loaded registry.
pub struct RegistryHandle {
    current: RwLock<Arc<ModelRegistry>>,
}

impl RegistryHandle {
    pub fn new(registry: ModelRegistry) -> Self {
        Self {
            current: RwLock::new(Arc::new(registry)),
        }
    }

    pub fn current(&self) -> Arc<ModelRegistry> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install `registry` and return the one it replaced. In-flight requests
    /// keep using their snapshot until they finish.
    pub fn swap(&self, registry: ModelRegistry) -> Arc<ModelRegistry> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(registry))
    }

    /// Load from disk and swap. On failure the current registry stays live.
    pub fn reload(&self, paths: &ModelPaths) -> Result<(), ModelLoadError> {
        let registry = ModelRegistry::load(paths)?;
        let previous = self.swap(registry);
        info!(
            previous_version = previous.version().unwrap_or("none"),
            "Model registry reloaded"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::heuristic_predictor::HeuristicYieldModel;
    use crate::domain::features::sample_record;

    #[test]
    fn test_fallback_only_registry_reports_unavailable() {
        let registry = ModelRegistry::fallback_only();
        assert!(!registry.available(ModelKind::Yield));
        assert!(!registry.available(ModelKind::Suitability));
        assert!(matches!(
            registry.predict_yield(&sample_record()),
            Err(ModelError::Unavailable {
                kind: ModelKind::Yield
            })
        ));
        assert!(registry.predict_suitability(&sample_record()).is_err());
    }

    #[test]
    fn test_all_disabled_skips_disk() {
        let paths = ModelPaths {
            dir: PathBuf::from("/definitely/not/here"),
            suitability_enabled: false,
            yield_enabled: false,
        };
        let registry = ModelRegistry::load(&paths).expect("nothing to load");
        assert!(registry.metadata().is_none());
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let paths = ModelPaths::new("/definitely/not/here");
        assert!(matches!(
            ModelRegistry::load(&paths),
            Err(ModelLoadError::MissingArtifact { .. })
        ));
    }

    #[test]
    fn test_swap_returns_previous() {
        let handle = RegistryHandle::new(ModelRegistry::fallback_only());
        let snapshot = handle.current();

        let previous = handle.swap(ModelRegistry::from_parts(
            None,
            None,
            Some(Box::new(HeuristicYieldModel)),
        ));

        assert!(Arc::ptr_eq(&snapshot, &previous));
        assert!(!snapshot.available(ModelKind::Yield));
        assert!(handle.current().available(ModelKind::Yield));
    }
}

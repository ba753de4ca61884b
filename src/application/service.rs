use crate::application::ml::{ModelPaths, RegistryHandle};
use crate::application::persistence::{PersistenceGateway, PersistenceOutcome, StorageStatus};
use crate::application::prediction::PredictionOrchestrator;
use crate::domain::agronomy::{CropDetails, CropType};
use crate::domain::errors::{FieldViolation, ModelLoadError, ValidationError};
use crate::domain::prediction::{ModelKind, PersistedRecord};
use crate::domain::validation::FeatureValidator;
use crate::infrastructure::observability::{LatencyGuard, Metrics};
use crate::interfaces::envelope::ResponseEnvelope;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const MAX_RECENT_LIMIT: usize = 100;

/// Envelope for the caller plus the signals the web layer needs but must
/// not show: where the write went and whether anything degraded.
#[derive(Debug, Clone)]
pub struct ServiceResponse {
    pub envelope: ResponseEnvelope,
    /// `None` when the request never reached persistence
    pub persistence: Option<PersistenceOutcome>,
    /// A fallback produced part of the result or the write failed
    pub degraded: bool,
}

impl ServiceResponse {
    fn rejected(envelope: ResponseEnvelope) -> Self {
        Self {
            envelope,
            persistence: None,
            degraded: false,
        }
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self.persistence, Some(PersistenceOutcome::Persisted { .. }))
    }

    pub fn to_value(&self) -> Value {
        self.envelope.to_value()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelState {
    Loaded,
    Disabled,
}

impl ModelState {
    fn of(loaded: bool) -> Self {
        if loaded {
            ModelState::Loaded
        } else {
            ModelState::Disabled
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub suitability_model: ModelState,
    pub yield_model: ModelState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    pub storage: StorageStatus,
    pub crops_available: Vec<&'static str>,
}

/// Inbound façade: request mapping in, envelope out.
pub struct PredictionService {
    orchestrator: PredictionOrchestrator,
    gateway: PersistenceGateway,
    metrics: Metrics,
    model_paths: Option<ModelPaths>,
}

impl PredictionService {
    pub fn new(
        orchestrator: PredictionOrchestrator,
        gateway: PersistenceGateway,
        metrics: Metrics,
    ) -> Self {
        let service = Self {
            orchestrator,
            gateway,
            metrics,
            model_paths: None,
        };
        service.publish_model_state();
        service
    }

    /// Remember where models were loaded from so `reload_models` can re-read them.
    pub fn with_model_paths(mut self, paths: ModelPaths) -> Self {
        self.model_paths = Some(paths);
        self
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn registry(&self) -> &Arc<RegistryHandle> {
        self.orchestrator.registry()
    }

    /// Validate, predict, persist (best effort) and wrap.
    pub async fn handle(&self, payload: &Value) -> ServiceResponse {
        let latency = LatencyGuard::new(self.metrics.prediction_latency_seconds.clone());

        let features = match FeatureValidator::validate(payload) {
            Ok(features) => features,
            Err(e) => {
                self.metrics.validation_failures_total.inc();
                info!(fields = ?e.fields().collect::<Vec<_>>(), "Rejected prediction request");
                return ServiceResponse::rejected(ResponseEnvelope::validation(&e));
            }
        };

        let result = match self.orchestrator.predict(&features) {
            Ok(result) => result,
            Err(e) => {
                self.metrics.unexpected_errors_total.inc();
                error!(error = %e, crop = %features.crop_type(), "Prediction failed");
                return ServiceResponse::rejected(ResponseEnvelope::unexpected());
            }
        };

        self.metrics.inc_predictions(
            result.yield_source().as_str(),
            result.suitability_source().as_str(),
        );

        let envelope = match ResponseEnvelope::prediction(&result) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.metrics.unexpected_errors_total.inc();
                error!(error = %e, "Failed to serialize prediction result");
                return ServiceResponse::rejected(ResponseEnvelope::unexpected());
            }
        };

        let used_fallback = result.used_fallback();
        let outcome = self.gateway.store(PersistedRecord::new(features, result)).await;
        self.metrics.inc_persistence(outcome.label());

        if used_fallback {
            warn!("Prediction served with fallback heuristics");
        }
        debug!(
            elapsed_ms = latency.elapsed_ms(),
            persistence = outcome.label(),
            "Prediction handled"
        );

        ServiceResponse {
            envelope,
            degraded: used_fallback || outcome.is_failure(),
            persistence: Some(outcome),
        }
    }

    /// Every crop evaluated for the submitted field conditions, best
    /// expected yield first. Rankings are not persisted.
    pub fn rank_crops(&self, payload: &Value) -> ResponseEnvelope {
        let conditions = match FeatureValidator::validate_conditions(payload) {
            Ok(conditions) => conditions,
            Err(e) => {
                self.metrics.validation_failures_total.inc();
                info!(fields = ?e.fields().collect::<Vec<_>>(), "Rejected ranking request");
                return ResponseEnvelope::validation(&e);
            }
        };

        let rankings = match self.orchestrator.rank_crops(&conditions) {
            Ok(rankings) => rankings,
            Err(e) => {
                self.metrics.unexpected_errors_total.inc();
                error!(error = %e, soil = %conditions.soil_type(), "Crop ranking failed");
                return ResponseEnvelope::unexpected();
            }
        };

        info!(
            soil = %conditions.soil_type(),
            user_id = conditions.user_id(),
            top = ?rankings.first().map(|r| r.crop()),
            "Crops ranked"
        );

        ResponseEnvelope::success(format!("Evaluated {} crops", rankings.len()), &rankings)
            .unwrap_or_else(|e| {
                error!(error = %e, "Failed to serialize crop rankings");
                ResponseEnvelope::unexpected()
            })
    }

    /// Profiles of every supported crop.
    pub fn crop_catalogue(&self) -> ResponseEnvelope {
        let crops: Vec<CropDetails> = CropType::ALL.iter().map(|c| c.details()).collect();
        ResponseEnvelope::success(format!("Found {} crops", crops.len()), &crops)
            .unwrap_or_else(|e| {
                error!(error = %e, "Failed to serialize crop catalogue");
                ResponseEnvelope::unexpected()
            })
    }

    /// Profile of one crop by name (case-insensitive).
    pub fn crop_details(&self, name: &str) -> ResponseEnvelope {
        let crop = match name.parse::<CropType>() {
            Ok(crop) => crop,
            Err(reason) => {
                return ResponseEnvelope::validation(&ValidationError {
                    violations: vec![FieldViolation::new("cropType", reason)],
                });
            }
        };

        ResponseEnvelope::success(format!("Details for {}", crop), &crop.details())
            .unwrap_or_else(|e| {
                error!(error = %e, "Failed to serialize crop details");
                ResponseEnvelope::unexpected()
            })
    }

    /// Latest stored predictions for a user, wrapped in an envelope.
    pub async fn recent_predictions(&self, user_id: &str, limit: usize) -> ResponseEnvelope {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return ResponseEnvelope::validation(&ValidationError {
                violations: vec![FieldViolation::new("userId", "is required")],
            });
        }

        let rows = self
            .gateway
            .recent_for_user(user_id, limit.clamp(1, MAX_RECENT_LIMIT))
            .await;

        ResponseEnvelope::success(format!("Found {} predictions", rows.len()), &rows)
            .unwrap_or_else(|e| {
                error!(error = %e, "Failed to serialize stored predictions");
                ResponseEnvelope::unexpected()
            })
    }

    pub async fn health(&self) -> HealthReport {
        let registry = self.orchestrator.registry().current();
        let suitability_model = ModelState::of(registry.available(ModelKind::Suitability));
        let yield_model = ModelState::of(registry.available(ModelKind::Yield));
        let storage = self.gateway.status().await;

        let degraded = suitability_model != ModelState::Loaded
            || yield_model != ModelState::Loaded
            || storage == StorageStatus::Unavailable;

        HealthReport {
            status: if degraded {
                HealthStatus::Degraded
            } else {
                HealthStatus::Healthy
            },
            suitability_model,
            yield_model,
            model_version: registry.version().map(str::to_string),
            storage,
            crops_available: CropType::ALL.iter().map(|c| c.as_str()).collect(),
        }
    }

    /// Wait up to `limit` for background writes before the runtime stops.
    /// Returns how many were abandoned.
    pub async fn shutdown(&self, limit: Duration) -> usize {
        self.gateway.drain(limit).await
    }

    /// Re-read artifacts from the configured directory and swap them in.
    /// On failure the models currently serving stay live.
    pub fn reload_models(&self) -> Result<(), ModelLoadError> {
        let Some(paths) = &self.model_paths else {
            return Err(ModelLoadError::NoModelDirectory);
        };

        let result = self.orchestrator.registry().reload(paths);
        if let Err(e) = &result {
            error!(error = %e, "Model reload failed; keeping current models");
        }
        self.publish_model_state();
        result
    }

    fn publish_model_state(&self) {
        let registry = self.orchestrator.registry().current();
        for kind in [ModelKind::Suitability, ModelKind::Yield] {
            self.metrics
                .set_model_loaded(&kind.to_string(), registry.available(kind));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::ModelRegistry;
    use crate::domain::agronomy::PricingTable;
    use crate::domain::errors::ErrorCode;
    use crate::infrastructure::InMemoryPredictionRepository;
    use serde_json::json;

    fn service(repo: Arc<InMemoryPredictionRepository>) -> PredictionService {
        let orchestrator = PredictionOrchestrator::new(
            Arc::new(RegistryHandle::new(ModelRegistry::fallback_only())),
            Some(PricingTable::builtin()),
        );
        let gateway = PersistenceGateway::new(repo, Duration::from_secs(1), false);
        PredictionService::new(orchestrator, gateway, Metrics::new().unwrap())
    }

    fn wheat(user: &str) -> Value {
        json!({
            "cropType": "Wheat", "farmArea": 10, "soilType": "Loamy", "soilPh": 6.5,
            "waterUsage": 4000, "fertilizer": 2.0, "temperature": 25, "humidity": 65,
            "userId": user
        })
    }

    #[tokio::test]
    async fn test_handle_persists_and_counts() {
        let repo = Arc::new(InMemoryPredictionRepository::new());
        let service = service(repo.clone());

        let response = service.handle(&wheat("u1")).await;
        assert!(response.envelope.is_success());
        assert!(response.is_persisted());
        // Models are not loaded, so the fallback answered
        assert!(response.degraded);
        assert_eq!(repo.count().await, 1);

        let text = service.metrics().gather_text();
        assert!(text.contains("cropwise_persistence_total{outcome=\"persisted\"} 1"));
        assert!(text.contains("cropwise_prediction_latency_seconds_count 1"));
    }

    #[tokio::test]
    async fn test_validation_failure_skips_persistence() {
        let repo = Arc::new(InMemoryPredictionRepository::new());
        let service = service(repo.clone());

        let response = service.handle(&json!({"cropType": "Wheat"})).await;
        assert_eq!(response.envelope.error_code(), Some(ErrorCode::ValidationError));
        assert!(response.persistence.is_none());
        assert_eq!(repo.count().await, 0);
        assert!(
            service
                .metrics()
                .gather_text()
                .contains("cropwise_validation_failures_total 1")
        );
    }

    #[tokio::test]
    async fn test_recent_predictions() {
        let repo = Arc::new(InMemoryPredictionRepository::new());
        let service = service(repo);
        service.handle(&wheat("u1")).await;
        service.handle(&wheat("u1")).await;
        service.handle(&wheat("u2")).await;

        let value = service.recent_predictions("u1", 10).await.to_value();
        assert_eq!(value["status"], "success");
        assert_eq!(value["payload"].as_array().unwrap().len(), 2);

        let missing = service.recent_predictions("  ", 10).await;
        assert_eq!(missing.error_code(), Some(ErrorCode::ValidationError));
    }

    #[tokio::test]
    async fn test_health_reports_fallback_as_degraded() {
        let service = service(Arc::new(InMemoryPredictionRepository::new()));
        let health = service.health().await;

        assert_eq!(health.status, HealthStatus::Degraded);
        assert_eq!(health.yield_model, ModelState::Disabled);
        assert_eq!(health.storage, StorageStatus::Connected);
        assert_eq!(health.crops_available.len(), 5);
        assert!(health.model_version.is_none());
    }

    #[test]
    fn test_reload_without_paths_fails() {
        let service = service(Arc::new(InMemoryPredictionRepository::new()));
        assert!(matches!(
            service.reload_models(),
            Err(ModelLoadError::NoModelDirectory)
        ));
    }

    #[test]
    fn test_rank_crops_envelope() {
        let service = service(Arc::new(InMemoryPredictionRepository::new()));
        let value = service
            .rank_crops(&json!({
                "farmArea": 10, "soilType": "Loamy", "soilPh": 6.5,
                "temperature": 25, "humidity": 65, "userId": "u1"
            }))
            .to_value();

        assert_eq!(value["status"], "success");
        let rankings = value["payload"].as_array().unwrap();
        assert_eq!(rankings.len(), 5);
        assert_eq!(rankings[0]["crop"], "Sugarcane");
        assert_eq!(rankings[0]["season"], "Whole Year");
        assert!(rankings[0]["net_profit"].is_number());
    }

    #[test]
    fn test_rank_crops_validation() {
        let service = service(Arc::new(InMemoryPredictionRepository::new()));
        let envelope = service.rank_crops(&json!({"soilType": "Loamy"}));
        assert_eq!(envelope.error_code(), Some(ErrorCode::ValidationError));
        assert!(envelope.message().contains("farmArea"));
    }

    #[test]
    fn test_crop_catalogue_and_details() {
        let service = service(Arc::new(InMemoryPredictionRepository::new()));

        let catalogue = service.crop_catalogue().to_value();
        assert_eq!(catalogue["payload"].as_array().unwrap().len(), 5);

        let rice = service.crop_details("rice").to_value();
        assert_eq!(rice["status"], "success");
        assert_eq!(rice["payload"]["name"], "Rice");
        assert_eq!(rice["payload"]["season"], "Kharif");
        assert_eq!(rice["payload"]["duration"], "90-120 days");

        let unknown = service.crop_details("Barley");
        assert_eq!(unknown.error_code(), Some(ErrorCode::ValidationError));
        assert!(unknown.message().contains("cropType"));
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_background_writes() {
        let repo = Arc::new(InMemoryPredictionRepository::new());
        let orchestrator = PredictionOrchestrator::new(
            Arc::new(RegistryHandle::new(ModelRegistry::fallback_only())),
            None,
        );
        let gateway = PersistenceGateway::new(repo.clone(), Duration::from_secs(1), true);
        let service = PredictionService::new(orchestrator, gateway, Metrics::new().unwrap());

        for i in 0..10 {
            let response = service.handle(&wheat(&format!("u{}", i))).await;
            assert!(matches!(response.persistence, Some(PersistenceOutcome::Pending { .. })));
        }

        assert_eq!(service.shutdown(Duration::from_secs(5)).await, 0);
        assert_eq!(repo.count().await, 10);
    }
}

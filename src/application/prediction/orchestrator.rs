use super::{advisory, profitability};
use crate::application::ml::heuristic_predictor::{HeuristicSuitabilityModel, HeuristicYieldModel};
use crate::application::ml::{
    ModelRegistry, RegistryHandle, SuitabilityEstimator, YieldEstimate, YieldEstimator,
};
use crate::domain::agronomy::{CropType, PricingTable};
use crate::domain::errors::PredictionError;
use crate::domain::features::{FeatureRecord, GrowingConditions};
use crate::domain::prediction::{
    CropRanking, ModelKind, PredictionResult, PredictionSource, SuitabilityLabel,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Composes model (or fallback) output into a `PredictionResult`.
///
/// Stateless apart from the shared registry handle and the pricing table, so
/// one instance serves every request concurrently. The same record and the
/// same registry always give the same result.
pub struct PredictionOrchestrator {
    registry: Arc<RegistryHandle>,
    fallback_yield: HeuristicYieldModel,
    fallback_suitability: HeuristicSuitabilityModel,
    pricing: Option<PricingTable>,
}

impl PredictionOrchestrator {
    pub fn new(registry: Arc<RegistryHandle>, pricing: Option<PricingTable>) -> Self {
        Self {
            registry,
            fallback_yield: HeuristicYieldModel,
            fallback_suitability: HeuristicSuitabilityModel,
            pricing,
        }
    }

    pub fn registry(&self) -> &Arc<RegistryHandle> {
        &self.registry
    }

    pub fn predict(&self, record: &FeatureRecord) -> Result<PredictionResult, PredictionError> {
        // One snapshot per request so both kinds come from the same model generation
        let registry = self.registry.current();
        self.predict_with(&registry, record)
    }

    /// Every crop under the same field conditions, each at its own optimal
    /// water and fertilizer rate. Highest expected yield first; equal yields
    /// keep catalogue order.
    pub fn rank_crops(
        &self,
        conditions: &GrowingConditions,
    ) -> Result<Vec<CropRanking>, PredictionError> {
        let registry = self.registry.current();

        let mut rankings = CropType::ALL
            .into_iter()
            .map(|crop| {
                let result = self.predict_with(&registry, &conditions.for_crop(crop))?;
                Ok(CropRanking::new(crop, &result))
            })
            .collect::<Result<Vec<_>, PredictionError>>()?;

        rankings.sort_by(|a, b| b.expected_yield().total_cmp(&a.expected_yield()));
        Ok(rankings)
    }

    fn predict_with(
        &self,
        registry: &ModelRegistry,
        record: &FeatureRecord,
    ) -> Result<PredictionResult, PredictionError> {
        let (suitability, suitability_source) = self.suitability(registry, record)?;
        let (estimate, yield_source) = self.yield_estimate(registry, record)?;

        if !estimate.tonnes.is_finite() || !estimate.confidence.is_finite() {
            return Err(PredictionError::Unexpected(format!(
                "non-finite estimate ({}, {})",
                estimate.tonnes, estimate.confidence
            )));
        }

        let predicted_yield = advisory::round2(estimate.tonnes.max(0.0));
        let confidence = estimate.confidence.clamp(0.0, 1.0);

        let profitability = self
            .pricing
            .as_ref()
            .and_then(|table| profitability::breakdown(table, record, predicted_yield));
        if profitability.is_none() {
            debug!(crop = %record.crop_type(), "No pricing data; profitability omitted");
        }

        let model_version = if yield_source == PredictionSource::Model
            || suitability_source == PredictionSource::Model
        {
            registry.version().map(str::to_string)
        } else {
            None
        };

        Ok(PredictionResult {
            predicted_yield,
            confidence,
            suitability,
            recommendations: advisory::recommendations(record, suitability),
            profitability,
            yield_range: advisory::yield_range(predicted_yield, confidence),
            risk_factors: advisory::risk_factors(record, predicted_yield),
            optimization_score: advisory::optimization_score(record),
            yield_source,
            suitability_source,
            model_version,
        })
    }

    fn suitability(
        &self,
        registry: &ModelRegistry,
        record: &FeatureRecord,
    ) -> Result<(SuitabilityLabel, PredictionSource), PredictionError> {
        let primary = if registry.available(ModelKind::Suitability) {
            registry.suitability_estimator()
        } else {
            None
        };
        let fallback: &dyn SuitabilityEstimator = &self.fallback_suitability;

        for estimator in primary.into_iter().chain(Some(fallback)) {
            match estimator.classify(record) {
                Ok(label) => return Ok((label, estimator.source())),
                Err(e) => {
                    warn!(estimator = estimator.name(), error = %e, "Suitability estimator failed")
                }
            }
        }

        Err(PredictionError::Unexpected(
            "no suitability estimator produced a label".to_string(),
        ))
    }

    fn yield_estimate(
        &self,
        registry: &ModelRegistry,
        record: &FeatureRecord,
    ) -> Result<(YieldEstimate, PredictionSource), PredictionError> {
        let primary = if registry.available(ModelKind::Yield) {
            registry.yield_estimator()
        } else {
            None
        };
        let fallback: &dyn YieldEstimator = &self.fallback_yield;

        for estimator in primary.into_iter().chain(Some(fallback)) {
            match estimator.estimate(record) {
                Ok(estimate) => return Ok((estimate, estimator.source())),
                Err(e) => {
                    warn!(estimator = estimator.name(), error = %e, "Yield estimator failed")
                }
            }
        }

        Err(PredictionError::Unexpected(
            "no yield estimator produced an estimate".to_string(),
        ))
    }
}

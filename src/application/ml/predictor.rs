use crate::domain::errors::ModelError;
use crate::domain::features::FeatureRecord;
use crate::domain::prediction::{PredictionSource, SuitabilityLabel};

/// Yield for the whole farm plus the estimator's certainty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldEstimate {
    /// Tonnes, never negative
    pub tonnes: f64,
    /// In [0, 1]
    pub confidence: f64,
}

/// Anything that can turn a feature record into a yield estimate.
/// Implemented by trained models and by the rule-based fallback alike.
pub trait YieldEstimator: Send + Sync {
    fn estimate(&self, record: &FeatureRecord) -> Result<YieldEstimate, ModelError>;

    fn source(&self) -> PredictionSource;

    /// Get model name/type
    fn name(&self) -> &str;
}

/// Anything that can grade how well a crop fits the submitted conditions.
pub trait SuitabilityEstimator: Send + Sync {
    fn classify(&self, record: &FeatureRecord) -> Result<SuitabilityLabel, ModelError>;

    fn source(&self) -> PredictionSource;

    fn name(&self) -> &str;
}

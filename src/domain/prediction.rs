use crate::domain::agronomy::CropType;
use crate::domain::features::FeatureRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The two model families served by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Suitability,
    Yield,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Suitability => write!(f, "suitability"),
            ModelKind::Yield => write!(f, "yield"),
        }
    }
}

/// Categorical fit of a crop to the submitted conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SuitabilityLabel {
    Low,
    Medium,
    High,
    Excellent,
}

impl SuitabilityLabel {
    pub const ALL: [SuitabilityLabel; 4] = [
        SuitabilityLabel::Low,
        SuitabilityLabel::Medium,
        SuitabilityLabel::High,
        SuitabilityLabel::Excellent,
    ];

    /// Class id emitted by the trained classifier.
    pub fn from_class_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(SuitabilityLabel::Low),
            1 => Some(SuitabilityLabel::Medium),
            2 => Some(SuitabilityLabel::High),
            3 => Some(SuitabilityLabel::Excellent),
            _ => None,
        }
    }

    pub fn class_id(&self) -> i32 {
        match self {
            SuitabilityLabel::Low => 0,
            SuitabilityLabel::Medium => 1,
            SuitabilityLabel::High => 2,
            SuitabilityLabel::Excellent => 3,
        }
    }
}

impl fmt::Display for SuitabilityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for SuitabilityLabel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(SuitabilityLabel::Low),
            "Medium" => Ok(SuitabilityLabel::Medium),
            "High" => Ok(SuitabilityLabel::High),
            "Excellent" => Ok(SuitabilityLabel::Excellent),
            _ => anyhow::bail!("Unknown suitability label: {}", s),
        }
    }
}

/// Whether a value came from a trained model or the rule-based fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionSource {
    Model,
    Fallback,
}

impl PredictionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionSource::Model => "model",
            PredictionSource::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldRange {
    pub min: f64,
    pub max: f64,
}

/// Output of one orchestrated prediction. Built once by the orchestrator,
/// read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Tonnes for the whole farm
    pub(crate) predicted_yield: f64,
    /// Model certainty in [0, 1]
    pub(crate) confidence: f64,
    pub(crate) suitability: SuitabilityLabel,
    pub(crate) recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) profitability: Option<BTreeMap<String, f64>>,
    pub(crate) yield_range: YieldRange,
    pub(crate) risk_factors: Vec<String>,
    pub(crate) optimization_score: u8,
    pub(crate) yield_source: PredictionSource,
    pub(crate) suitability_source: PredictionSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) model_version: Option<String>,
}

impl PredictionResult {
    pub fn predicted_yield(&self) -> f64 {
        self.predicted_yield
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn suitability(&self) -> SuitabilityLabel {
        self.suitability
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    /// `price_per_tonne`, `revenue`, `estimated_cost`, `net_profit`
    pub fn profitability(&self) -> Option<&BTreeMap<String, f64>> {
        self.profitability.as_ref()
    }

    pub fn yield_range(&self) -> YieldRange {
        self.yield_range
    }

    pub fn risk_factors(&self) -> &[String] {
        &self.risk_factors
    }

    /// 0 to 100
    pub fn optimization_score(&self) -> u8 {
        self.optimization_score
    }

    pub fn yield_source(&self) -> PredictionSource {
        self.yield_source
    }

    pub fn suitability_source(&self) -> PredictionSource {
        self.suitability_source
    }

    pub fn model_version(&self) -> Option<&str> {
        self.model_version.as_deref()
    }

    /// True when any part of the result came from a fallback heuristic.
    pub fn used_fallback(&self) -> bool {
        self.yield_source == PredictionSource::Fallback
            || self.suitability_source == PredictionSource::Fallback
    }
}

/// One candidate crop in a ranking, evaluated at its optimal input rates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropRanking {
    pub(crate) crop: CropType,
    pub(crate) suitability: SuitabilityLabel,
    /// Tonnes for the whole farm
    pub(crate) expected_yield: f64,
    pub(crate) confidence: f64,
    /// Omitted for crops without a price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) net_profit: Option<f64>,
    pub(crate) optimization_score: u8,
    pub(crate) risk_factors: Vec<String>,
    pub(crate) yield_source: PredictionSource,
    pub(crate) season: &'static str,
    pub(crate) duration: &'static str,
}

impl CropRanking {
    pub fn new(crop: CropType, result: &PredictionResult) -> Self {
        let profile = crop.profile();
        Self {
            crop,
            suitability: result.suitability,
            expected_yield: result.predicted_yield,
            confidence: result.confidence,
            net_profit: result
                .profitability
                .as_ref()
                .and_then(|p| p.get("net_profit").copied()),
            optimization_score: result.optimization_score,
            risk_factors: result.risk_factors.clone(),
            yield_source: result.yield_source,
            season: profile.season,
            duration: profile.duration,
        }
    }

    pub fn crop(&self) -> CropType {
        self.crop
    }

    pub fn suitability(&self) -> SuitabilityLabel {
        self.suitability
    }

    pub fn expected_yield(&self) -> f64 {
        self.expected_yield
    }

    pub fn net_profit(&self) -> Option<f64> {
        self.net_profit
    }
}

/// A prediction as written to durable storage.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRecord {
    pub(crate) id: String,
    pub(crate) features: FeatureRecord,
    pub(crate) result: PredictionResult,
    pub(crate) created_at: DateTime<Utc>,
}

impl PersistedRecord {
    pub fn new(features: FeatureRecord, result: PredictionResult) -> Self {
        Self {
            id: generate_prediction_id(),
            features,
            result,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn features(&self) -> &FeatureRecord {
        &self.features
    }

    pub fn result(&self) -> &PredictionResult {
        &self.result
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// `YP_` followed by 16 lowercase hex characters.
pub fn generate_prediction_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("YP_{}", &hex[..16])
}

/// Summary row read back from storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredPrediction {
    pub id: String,
    pub user_id: Option<String>,
    pub crop_type: CropType,
    pub farm_area: f64,
    pub predicted_yield: f64,
    pub confidence: f64,
    pub suitability: SuitabilityLabel,
    pub recommendations: Vec<String>,
    pub profitability: Option<BTreeMap<String, f64>>,
    pub created_at: DateTime<Utc>,
}

impl From<&PersistedRecord> for StoredPrediction {
    fn from(record: &PersistedRecord) -> Self {
        Self {
            id: record.id.clone(),
            user_id: record.features.user_id().map(str::to_string),
            crop_type: record.features.crop_type(),
            farm_area: record.features.farm_area(),
            predicted_yield: record.result.predicted_yield,
            confidence: record.result.confidence,
            suitability: record.result.suitability,
            recommendations: record.result.recommendations.clone(),
            profitability: record.result.profitability.clone(),
            created_at: record.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_class_ids_round_trip() {
        for label in SuitabilityLabel::ALL {
            assert_eq!(SuitabilityLabel::from_class_id(label.class_id()), Some(label));
        }
        assert_eq!(SuitabilityLabel::from_class_id(7), None);
    }

    #[test]
    fn test_prediction_id_format() {
        let id = generate_prediction_id();
        assert!(id.starts_with("YP_"));
        assert_eq!(id.len(), 19);
        assert!(id[3..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, generate_prediction_id());
    }
}

//! Deterministic stand-ins for the trained models.
//!
//! Used whenever a model kind is disabled, absent, or fails at request time.
//! Every constant here comes from the crop policy table in
//! `domain::agronomy::crop`; nothing is random, so identical records always
//! produce identical output.

use super::predictor::{SuitabilityEstimator, YieldEstimate, YieldEstimator};
use crate::domain::agronomy::SoilFit;
use crate::domain::errors::ModelError;
use crate::domain::features::FeatureRecord;
use crate::domain::prediction::{PredictionSource, SuitabilityLabel};

/// Confidence reported for every fallback yield estimate.
pub const FALLBACK_CONFIDENCE: f64 = 0.4;

/// Yield multiplier for water supplied relative to the crop optimum.
pub fn water_adequacy(actual: f64, optimal: f64) -> f64 {
    let ratio = actual / optimal;
    if ratio < 0.5 {
        0.6 // Severe water stress
    } else if ratio < 0.8 {
        0.8
    } else if ratio <= 1.2 {
        1.0
    } else if ratio <= 1.5 {
        0.9
    } else {
        0.85 // Waterlogging
    }
}

/// Yield multiplier for fertilizer applied relative to the crop optimum.
pub fn fertilizer_adequacy(actual: f64, optimal: f64) -> f64 {
    let ratio = actual / optimal;
    if ratio < 0.5 {
        0.7
    } else if ratio < 0.8 {
        0.85
    } else if ratio <= 1.2 {
        1.0
    } else if ratio <= 1.5 {
        0.95
    } else {
        0.9
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicYieldModel;

impl HeuristicYieldModel {
    /// Potential yield for the farm with every input at its optimum.
    pub fn potential_tonnes(record: &FeatureRecord) -> f64 {
        record.crop_type().profile().base_yield_per_ha * record.farm_area()
    }
}

impl YieldEstimator for HeuristicYieldModel {
    fn estimate(&self, record: &FeatureRecord) -> Result<YieldEstimate, ModelError> {
        let profile = record.crop_type().profile();
        let tonnes = Self::potential_tonnes(record)
            * record.soil_type().quality_factor()
            * water_adequacy(record.water_usage(), profile.optimal_water)
            * fertilizer_adequacy(record.fertilizer(), profile.optimal_fertilizer);

        Ok(YieldEstimate {
            tonnes,
            confidence: FALLBACK_CONFIDENCE,
        })
    }

    fn source(&self) -> PredictionSource {
        PredictionSource::Fallback
    }

    fn name(&self) -> &str {
        "Crop table heuristic"
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicSuitabilityModel;

impl HeuristicSuitabilityModel {
    /// 0..=4: two points for pH, two for soil.
    pub fn compatibility_score(record: &FeatureRecord) -> u8 {
        let profile = record.crop_type().profile();

        let ph_points = match profile.ph_distance(record.soil_ph()) {
            d if d == 0.0 => 2,
            d if d <= 0.5 => 1,
            _ => 0,
        };

        let soil_points = match profile.soil_fit(record.soil_type()) {
            SoilFit::Preferred => 2,
            SoilFit::Tolerated => 1,
            SoilFit::Poor => 0,
        };

        ph_points + soil_points
    }
}

impl SuitabilityEstimator for HeuristicSuitabilityModel {
    fn classify(&self, record: &FeatureRecord) -> Result<SuitabilityLabel, ModelError> {
        Ok(match Self::compatibility_score(record) {
            4 => SuitabilityLabel::Excellent,
            3 => SuitabilityLabel::High,
            2 => SuitabilityLabel::Medium,
            _ => SuitabilityLabel::Low,
        })
    }

    fn source(&self) -> PredictionSource {
        PredictionSource::Fallback
    }

    fn name(&self) -> &str {
        "pH/soil compatibility table"
    }
}

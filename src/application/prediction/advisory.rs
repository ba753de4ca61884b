//! Rule-based post-processing of raw model output: recommendations, risk
//! factors, optimisation score and yield band.

use crate::domain::agronomy::SoilFit;
use crate::domain::features::FeatureRecord;
use crate::domain::prediction::{SuitabilityLabel, YieldRange};

/// Above this relative humidity disease pressure is flagged.
const HUMID_THRESHOLD: f64 = 85.0;

fn ratio(actual: f64, optimal: f64) -> f64 {
    actual / optimal
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Deterministic advice keyed on the suitability label and the gap between
/// required and supplied water/fertilizer. Never empty.
pub fn recommendations(record: &FeatureRecord, label: SuitabilityLabel) -> Vec<String> {
    let crop = record.crop_type();
    let profile = crop.profile();
    let mut recs = Vec::new();

    let fert_ratio = ratio(record.fertilizer(), profile.optimal_fertilizer);
    if fert_ratio < 0.8 {
        recs.push(format!(
            "Increase fertilizer to {:.1} t/ha for better yield",
            profile.optimal_fertilizer
        ));
    } else if fert_ratio > 1.3 {
        recs.push(format!(
            "Reduce fertilizer to {:.1} t/ha to prevent nutrient runoff",
            profile.optimal_fertilizer
        ));
    }

    let water_ratio = ratio(record.water_usage(), profile.optimal_water);
    if water_ratio < 0.8 {
        recs.push(format!(
            "Increase water supply to {:.0} m³/ha for optimal growth",
            profile.optimal_water
        ));
    } else if water_ratio > 1.3 {
        recs.push(format!(
            "Reduce water usage to {:.0} m³/ha to improve efficiency",
            profile.optimal_water
        ));
    }

    let ph_off = !profile.ph_in_range(record.soil_ph());
    let amend_ph = format!(
        "Amend soil pH toward {:.1}-{:.1} for {}",
        profile.ideal_ph.0, profile.ideal_ph.1, crop
    );

    match label {
        SuitabilityLabel::Low => {
            recs.push(format!(
                "Consider a crop better matched to {} soil at pH {:.1}",
                record.soil_type(),
                record.soil_ph()
            ));
            if ph_off {
                recs.push(amend_ph);
            }
        }
        SuitabilityLabel::Medium => {
            if ph_off {
                recs.push(amend_ph);
            }
            if profile.soil_fit(record.soil_type()) != SoilFit::Preferred {
                recs.push(format!(
                    "Add organic matter to improve {} soil structure for {}",
                    record.soil_type(),
                    crop
                ));
            }
        }
        SuitabilityLabel::High => {
            recs.push(format!(
                "Conditions suit {}; fine-tune inputs to reach full potential",
                crop
            ));
        }
        SuitabilityLabel::Excellent => {
            if recs.is_empty() {
                recs.push(format!(
                    "Conditions are well suited to {}; maintain current practices",
                    crop
                ));
            }
        }
    }

    if record.humidity() > HUMID_THRESHOLD {
        recs.push("High humidity: monitor closely for fungal disease".to_string());
    }

    if recs.is_empty() {
        recs.push("Maintain current practices and monitor crop health regularly".to_string());
    }

    recs
}

/// Conditions that put the estimate at risk.
pub fn risk_factors(record: &FeatureRecord, predicted_tonnes: f64) -> Vec<String> {
    let crop = record.crop_type();
    let profile = crop.profile();
    let potential = profile.base_yield_per_ha * record.farm_area();
    let mut factors = Vec::new();

    if predicted_tonnes < potential * 0.7 {
        factors.push("Yield significantly below optimal potential".to_string());
    }
    if record.fertilizer() < profile.optimal_fertilizer * 0.7 {
        factors.push("Insufficient fertilizer for optimal growth".to_string());
    }
    if record.water_usage() < profile.optimal_water * 0.7 {
        factors.push("Low water availability may stress crops".to_string());
    }
    if !profile.ph_in_range(record.soil_ph()) {
        factors.push(format!("Soil pH outside the ideal range for {}", crop));
    }
    if record.humidity() > HUMID_THRESHOLD {
        factors.push("High humidity raises disease pressure".to_string());
    }

    factors
}

/// 0-100 score of how close the inputs are to the crop optimum.
pub fn optimization_score(record: &FeatureRecord) -> u8 {
    let profile = record.crop_type().profile();
    let mut score: u32 = 50;

    let band_points = |r: f64| -> u32 {
        if (0.9..=1.1).contains(&r) {
            20
        } else if (0.8..=1.2).contains(&r) {
            10
        } else {
            0
        }
    };

    score += band_points(ratio(record.fertilizer(), profile.optimal_fertilizer));
    score += band_points(ratio(record.water_usage(), profile.optimal_water));
    if profile.ph_in_range(record.soil_ph()) {
        score += 10;
    }

    score.min(100) as u8
}

/// Band around the estimate that narrows as confidence grows.
pub fn yield_range(predicted_tonnes: f64, confidence: f64) -> YieldRange {
    let margin = predicted_tonnes * (0.15 - confidence * 0.1);
    YieldRange {
        min: round2((predicted_tonnes - margin).max(0.0)),
        max: round2(predicted_tonnes + margin),
    }
}

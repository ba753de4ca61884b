use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Crops the models were trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CropType {
    Rice,
    Wheat,
    Maize,
    Cotton,
    Sugarcane,
}

impl CropType {
    pub const ALL: [CropType; 5] = [
        CropType::Rice,
        CropType::Wheat,
        CropType::Maize,
        CropType::Cotton,
        CropType::Sugarcane,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CropType::Rice => "Rice",
            CropType::Wheat => "Wheat",
            CropType::Maize => "Maize",
            CropType::Cotton => "Cotton",
            CropType::Sugarcane => "Sugarcane",
        }
    }

    /// Catalogue entry for this crop.
    pub fn details(&self) -> CropDetails {
        CropDetails {
            name: *self,
            profile: self.profile(),
        }
    }

    /// Agronomic profile used by the fallback heuristics and the recommendation rules.
    pub fn profile(&self) -> &'static CropProfile {
        match self {
            CropType::Rice => &RICE,
            CropType::Wheat => &WHEAT,
            CropType::Maize => &MAIZE,
            CropType::Cotton => &COTTON,
            CropType::Sugarcane => &SUGARCANE,
        }
    }
}

impl fmt::Display for CropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CropType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        CropType::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                format!(
                    "must be one of {}",
                    CropType::ALL.map(|c| c.as_str()).join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoilType {
    Loamy,
    Sandy,
    Clay,
    Alluvial,
    Black,
    Red,
}

impl SoilType {
    pub const ALL: [SoilType; 6] = [
        SoilType::Loamy,
        SoilType::Sandy,
        SoilType::Clay,
        SoilType::Alluvial,
        SoilType::Black,
        SoilType::Red,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoilType::Loamy => "Loamy",
            SoilType::Sandy => "Sandy",
            SoilType::Clay => "Clay",
            SoilType::Alluvial => "Alluvial",
            SoilType::Black => "Black",
            SoilType::Red => "Red",
        }
    }

    /// Multiplier applied to the fallback yield estimate.
    pub fn quality_factor(&self) -> f64 {
        match self {
            SoilType::Loamy => 1.0,
            SoilType::Sandy => 0.8,
            SoilType::Clay => 0.9,
            SoilType::Alluvial => 1.1,
            SoilType::Black => 1.05,
            SoilType::Red => 0.75,
        }
    }
}

impl fmt::Display for SoilType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SoilType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        SoilType::ALL
            .into_iter()
            .find(|soil| soil.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                format!(
                    "must be one of {}",
                    SoilType::ALL.map(|s| s.as_str()).join(", ")
                )
            })
    }
}

/// How well a soil suits a crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoilFit {
    Preferred,
    Tolerated,
    Poor,
}

/// Static agronomic constants for one crop.
///
/// These values are a policy table, not learned parameters: they drive the
/// deterministic fallback path and the recommendation rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropProfile {
    /// Expected yield in tonnes per hectare under good conditions
    pub base_yield_per_ha: f64,
    /// Cubic metres per hectare per season
    pub optimal_water: f64,
    /// Tonnes per hectare per season
    pub optimal_fertilizer: f64,
    /// Inclusive (min, max)
    pub ideal_ph: (f64, f64),
    pub preferred_soils: &'static [SoilType],
    pub tolerated_soils: &'static [SoilType],
    /// Growing season (Kharif, Rabi, Whole Year)
    pub season: &'static str,
    /// Time from sowing to harvest
    pub duration: &'static str,
}

/// A crop together with its profile, as served by the crop catalogue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropDetails {
    pub name: CropType,
    #[serde(flatten)]
    pub profile: &'static CropProfile,
}

impl CropProfile {
    pub fn soil_fit(&self, soil: SoilType) -> SoilFit {
        if self.preferred_soils.contains(&soil) {
            SoilFit::Preferred
        } else if self.tolerated_soils.contains(&soil) {
            SoilFit::Tolerated
        } else {
            SoilFit::Poor
        }
    }

    pub fn ph_in_range(&self, ph: f64) -> bool {
        ph >= self.ideal_ph.0 && ph <= self.ideal_ph.1
    }

    /// Distance from the ideal pH band, 0 when inside it.
    pub fn ph_distance(&self, ph: f64) -> f64 {
        if ph < self.ideal_ph.0 {
            self.ideal_ph.0 - ph
        } else if ph > self.ideal_ph.1 {
            ph - self.ideal_ph.1
        } else {
            0.0
        }
    }
}

static RICE: CropProfile = CropProfile {
    base_yield_per_ha: 4.0,
    optimal_water: 6000.0,
    optimal_fertilizer: 2.5,
    ideal_ph: (5.5, 6.5),
    preferred_soils: &[SoilType::Clay, SoilType::Alluvial],
    tolerated_soils: &[SoilType::Loamy, SoilType::Black],
    season: "Kharif",
    duration: "90-120 days",
};

static WHEAT: CropProfile = CropProfile {
    base_yield_per_ha: 3.5,
    optimal_water: 4000.0,
    optimal_fertilizer: 2.0,
    ideal_ph: (6.0, 7.5),
    preferred_soils: &[SoilType::Loamy, SoilType::Alluvial],
    tolerated_soils: &[SoilType::Clay, SoilType::Black],
    season: "Rabi",
    duration: "110-130 days",
};

static MAIZE: CropProfile = CropProfile {
    base_yield_per_ha: 2.8,
    optimal_water: 3500.0,
    optimal_fertilizer: 1.8,
    ideal_ph: (5.8, 7.0),
    preferred_soils: &[SoilType::Loamy, SoilType::Alluvial],
    tolerated_soils: &[SoilType::Sandy, SoilType::Red, SoilType::Black],
    season: "Kharif",
    duration: "80-100 days",
};

static COTTON: CropProfile = CropProfile {
    base_yield_per_ha: 1.8,
    optimal_water: 4500.0,
    optimal_fertilizer: 2.2,
    ideal_ph: (5.8, 8.0),
    preferred_soils: &[SoilType::Black, SoilType::Alluvial],
    tolerated_soils: &[SoilType::Loamy, SoilType::Clay, SoilType::Red],
    season: "Kharif",
    duration: "150-170 days",
};

static SUGARCANE: CropProfile = CropProfile {
    base_yield_per_ha: 70.0,
    optimal_water: 8000.0,
    optimal_fertilizer: 3.0,
    ideal_ph: (6.0, 7.5),
    preferred_soils: &[SoilType::Loamy, SoilType::Alluvial],
    tolerated_soils: &[SoilType::Clay, SoilType::Black, SoilType::Red],
    season: "Whole Year",
    duration: "10-12 months",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_parse_is_case_insensitive() {
        assert_eq!("wheat".parse::<CropType>(), Ok(CropType::Wheat));
        assert_eq!("  SUGARCANE ".parse::<CropType>(), Ok(CropType::Sugarcane));
    }

    #[test]
    fn test_unknown_crop_lists_allowed_values() {
        let err = "Barley".parse::<CropType>().unwrap_err();
        assert!(err.contains("Rice"));
        assert!(err.contains("Sugarcane"));
    }

    #[test]
    fn test_soil_fit_tables() {
        let wheat = CropType::Wheat.profile();
        assert_eq!(wheat.soil_fit(SoilType::Loamy), SoilFit::Preferred);
        assert_eq!(wheat.soil_fit(SoilType::Clay), SoilFit::Tolerated);
        assert_eq!(wheat.soil_fit(SoilType::Sandy), SoilFit::Poor);
    }

    #[test]
    fn test_details_serialize_flat() {
        let value = serde_json::to_value(CropType::Wheat.details()).unwrap();
        assert_eq!(value["name"], "Wheat");
        assert_eq!(value["season"], "Rabi");
        assert_eq!(value["duration"], "110-130 days");
        assert_eq!(value["ideal_ph"], serde_json::json!([6.0, 7.5]));
        assert_eq!(value["preferred_soils"][0], "Loamy");
    }

    #[test]
    fn test_ph_distance() {
        let rice = CropType::Rice.profile();
        assert_eq!(rice.ph_distance(6.0), 0.0);
        assert!((rice.ph_distance(5.0) - 0.5).abs() < 1e-9);
        assert!((rice.ph_distance(7.5) - 1.0).abs() < 1e-9);
    }
}

use crate::domain::agronomy::{CropType, SoilType};
use serde::Serialize;

/// Ordered list of model input names.
/// This order MUST match the `feature_names` recorded in the artifact metadata.
/// Any change here is a breaking change for trained models.
pub const FEATURE_NAMES: &[&str] = &[
    "farm_area",
    "soil_ph",
    "water_usage",
    "fertilizer",
    "temperature",
    "humidity",
    "crop_type=Rice",
    "crop_type=Wheat",
    "crop_type=Maize",
    "crop_type=Cotton",
    "crop_type=Sugarcane",
    "soil_type=Loamy",
    "soil_type=Sandy",
    "soil_type=Clay",
    "soil_type=Alluvial",
    "soil_type=Black",
    "soil_type=Red",
];

/// A validated, bounded set of request features.
///
/// Only the validator constructs these, so every instance satisfies the
/// documented bounds. Fields are read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecord {
    crop_type: CropType,
    farm_area: f64,
    soil_type: SoilType,
    soil_ph: f64,
    water_usage: f64,
    fertilizer: f64,
    temperature: f64,
    humidity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
}

impl FeatureRecord {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        crop_type: CropType,
        farm_area: f64,
        soil_type: SoilType,
        soil_ph: f64,
        water_usage: f64,
        fertilizer: f64,
        temperature: f64,
        humidity: f64,
        user_id: Option<String>,
    ) -> Self {
        Self {
            crop_type,
            farm_area,
            soil_type,
            soil_ph,
            water_usage,
            fertilizer,
            temperature,
            humidity,
            user_id,
        }
    }

    pub fn crop_type(&self) -> CropType {
        self.crop_type
    }

    /// Hectares
    pub fn farm_area(&self) -> f64 {
        self.farm_area
    }

    pub fn soil_type(&self) -> SoilType {
        self.soil_type
    }

    pub fn soil_ph(&self) -> f64 {
        self.soil_ph
    }

    /// Cubic metres per hectare
    pub fn water_usage(&self) -> f64 {
        self.water_usage
    }

    /// Tonnes per hectare
    pub fn fertilizer(&self) -> f64 {
        self.fertilizer
    }

    /// Degrees Celsius
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Relative humidity, percent
    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

/// Field conditions without a crop choice, used to rank candidate crops.
///
/// Built by the validator like `FeatureRecord`; water and fertilizer are not
/// part of it because each crop is evaluated at its own optimal rates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowingConditions {
    farm_area: f64,
    soil_type: SoilType,
    soil_ph: f64,
    temperature: f64,
    humidity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
}

impl GrowingConditions {
    pub(crate) fn new(
        farm_area: f64,
        soil_type: SoilType,
        soil_ph: f64,
        temperature: f64,
        humidity: f64,
        user_id: Option<String>,
    ) -> Self {
        Self {
            farm_area,
            soil_type,
            soil_ph,
            temperature,
            humidity,
            user_id,
        }
    }

    pub fn farm_area(&self) -> f64 {
        self.farm_area
    }

    pub fn soil_type(&self) -> SoilType {
        self.soil_type
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// These conditions planted with `crop` at its optimal water and
    /// fertilizer rates.
    pub fn for_crop(&self, crop: CropType) -> FeatureRecord {
        let profile = crop.profile();
        FeatureRecord::new(
            crop,
            self.farm_area,
            self.soil_type,
            self.soil_ph,
            profile.optimal_water,
            profile.optimal_fertilizer,
            self.temperature,
            self.humidity,
            self.user_id.clone(),
        )
    }
}

/// Encodes a record into the model input vector (numeric block, then one-hot
/// crop and soil blocks) in `FEATURE_NAMES` order.
pub fn features_to_vector(record: &FeatureRecord) -> Vec<f64> {
    let mut vector = Vec::with_capacity(FEATURE_NAMES.len());
    vector.extend_from_slice(&[
        record.farm_area,
        record.soil_ph,
        record.water_usage,
        record.fertilizer,
        record.temperature,
        record.humidity,
    ]);
    vector.extend(
        CropType::ALL
            .iter()
            .map(|c| if *c == record.crop_type { 1.0 } else { 0.0 }),
    );
    vector.extend(
        SoilType::ALL
            .iter()
            .map(|s| if *s == record.soil_type { 1.0 } else { 0.0 }),
    );
    vector
}

#[cfg(test)]
pub(crate) fn sample_record() -> FeatureRecord {
    FeatureRecord::new(
        CropType::Wheat,
        10.0,
        SoilType::Loamy,
        6.5,
        4000.0,
        2.0,
        25.0,
        65.0,
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_vector_length() {
        let vec = features_to_vector(&sample_record());
        assert_eq!(vec.len(), FEATURE_NAMES.len());
    }

    #[test]
    fn test_feature_consistency() {
        let vec = features_to_vector(&sample_record());
        // farm_area is index 0
        assert_eq!(vec[0], 10.0);
        // humidity is the last numeric index (5)
        assert_eq!(vec[5], 65.0);
        // Wheat is the second crop column
        assert_eq!(vec[7], 1.0);
        assert_eq!(vec[6..11].iter().sum::<f64>(), 1.0);
        // Loamy is the first soil column
        assert_eq!(vec[11], 1.0);
        assert_eq!(vec[11..].iter().sum::<f64>(), 1.0);
    }

    #[test]
    fn test_conditions_use_optimal_rates() {
        let conditions = GrowingConditions::new(4.0, SoilType::Clay, 6.0, 28.0, 70.0, None);
        let rice = conditions.for_crop(CropType::Rice);

        assert_eq!(rice.crop_type(), CropType::Rice);
        assert_eq!(rice.farm_area(), 4.0);
        assert_eq!(rice.soil_type(), SoilType::Clay);
        assert_eq!(rice.water_usage(), CropType::Rice.profile().optimal_water);
        assert_eq!(rice.fertilizer(), CropType::Rice.profile().optimal_fertilizer);
        assert_eq!(rice.humidity(), 70.0);
    }

    #[test]
    fn test_one_hot_names_follow_enum_order() {
        for (i, crop) in CropType::ALL.iter().enumerate() {
            assert_eq!(FEATURE_NAMES[6 + i], format!("crop_type={}", crop));
        }
        for (i, soil) in SoilType::ALL.iter().enumerate() {
            assert_eq!(FEATURE_NAMES[11 + i], format!("soil_type={}", soil));
        }
    }
}

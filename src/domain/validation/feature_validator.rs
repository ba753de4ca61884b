use crate::domain::agronomy::{CropType, SoilType};
use crate::domain::errors::{FieldViolation, ValidationError};
use crate::domain::features::{FeatureRecord, GrowingConditions};
use serde_json::{Map, Value};
use std::str::FromStr;

const MAX_USER_ID_LEN: usize = 64;

/// Inclusive numeric bounds for one wire field. `exclusive_min` turns the
/// lower bound into a strict inequality.
struct Bound {
    key: &'static str,
    min: f64,
    max: f64,
    exclusive_min: bool,
}

impl Bound {
    const fn closed(key: &'static str, min: f64, max: f64) -> Self {
        Self {
            key,
            min,
            max,
            exclusive_min: false,
        }
    }

    fn contains(&self, value: f64) -> bool {
        let above_min = if self.exclusive_min {
            value > self.min
        } else {
            value >= self.min
        };
        above_min && value <= self.max
    }

    fn describe(&self) -> String {
        if self.exclusive_min {
            format!("must be greater than {} and at most {}", self.min, self.max)
        } else {
            format!("must be between {} and {}", self.min, self.max)
        }
    }
}

const FARM_AREA: Bound = Bound {
    key: "farmArea",
    min: 0.0,
    max: 1000.0,
    exclusive_min: true,
};
const SOIL_PH: Bound = Bound::closed("soilPh", 0.0, 14.0);
const WATER_USAGE: Bound = Bound::closed("waterUsage", 0.0, 20_000.0);
const FERTILIZER: Bound = Bound::closed("fertilizer", 0.0, 10.0);
const TEMPERATURE: Bound = Bound::closed("temperature", -10.0, 50.0);
const HUMIDITY: Bound = Bound::closed("humidity", 0.0, 100.0);

/// Turns an untyped request mapping into a `FeatureRecord`.
///
/// Every field is checked independently so the caller gets the full list of
/// problems at once. Each field contributes at most one violation. Keys that
/// are not part of the schema are ignored.
pub struct FeatureValidator;

impl FeatureValidator {
    pub fn validate(payload: &Value) -> Result<FeatureRecord, ValidationError> {
        Self::validate_map(object(payload)?)
    }

    /// Crop-independent subset used for ranking. `cropType`, `waterUsage` and
    /// `fertilizer` are not read.
    pub fn validate_conditions(payload: &Value) -> Result<GrowingConditions, ValidationError> {
        let map = object(payload)?;
        let mut violations = Vec::new();

        let farm_area = numeric(map, &FARM_AREA, &mut violations);
        let soil_type = categorical::<SoilType>(map, "soilType", &mut violations);
        let soil_ph = numeric(map, &SOIL_PH, &mut violations);
        let temperature = numeric(map, &TEMPERATURE, &mut violations);
        let humidity = numeric(map, &HUMIDITY, &mut violations);
        let user_id = optional_user_id(map, &mut violations);

        match (farm_area, soil_type, soil_ph, temperature, humidity) {
            (Some(farm_area), Some(soil_type), Some(soil_ph), Some(temperature), Some(humidity))
                if violations.is_empty() =>
            {
                Ok(GrowingConditions::new(
                    farm_area,
                    soil_type,
                    soil_ph,
                    temperature,
                    humidity,
                    user_id,
                ))
            }
            _ => Err(ValidationError { violations }),
        }
    }

    pub fn validate_map(map: &Map<String, Value>) -> Result<FeatureRecord, ValidationError> {
        let mut violations = Vec::new();

        let crop_type = categorical::<CropType>(map, "cropType", &mut violations);
        let farm_area = numeric(map, &FARM_AREA, &mut violations);
        let soil_type = categorical::<SoilType>(map, "soilType", &mut violations);
        let soil_ph = numeric(map, &SOIL_PH, &mut violations);
        let water_usage = numeric(map, &WATER_USAGE, &mut violations);
        let fertilizer = numeric(map, &FERTILIZER, &mut violations);
        let temperature = numeric(map, &TEMPERATURE, &mut violations);
        let humidity = numeric(map, &HUMIDITY, &mut violations);
        let user_id = optional_user_id(map, &mut violations);

        match (
            crop_type,
            farm_area,
            soil_type,
            soil_ph,
            water_usage,
            fertilizer,
            temperature,
            humidity,
        ) {
            (
                Some(crop_type),
                Some(farm_area),
                Some(soil_type),
                Some(soil_ph),
                Some(water_usage),
                Some(fertilizer),
                Some(temperature),
                Some(humidity),
            ) if violations.is_empty() => Ok(FeatureRecord::new(
                crop_type,
                farm_area,
                soil_type,
                soil_ph,
                water_usage,
                fertilizer,
                temperature,
                humidity,
                user_id,
            )),
            _ => Err(ValidationError { violations }),
        }
    }
}

fn object(payload: &Value) -> Result<&Map<String, Value>, ValidationError> {
    payload.as_object().ok_or_else(|| ValidationError {
        violations: vec![FieldViolation::new("body", "must be a JSON object")],
    })
}

/// Null counts as absent.
fn present<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

fn coerce_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn numeric(
    map: &Map<String, Value>,
    bound: &Bound,
    violations: &mut Vec<FieldViolation>,
) -> Option<f64> {
    let Some(raw) = present(map, bound.key) else {
        violations.push(FieldViolation::new(bound.key, "is required"));
        return None;
    };

    let Some(value) = coerce_f64(raw) else {
        violations.push(FieldViolation::new(bound.key, "must be a number"));
        return None;
    };

    if !bound.contains(value) {
        violations.push(FieldViolation::new(bound.key, bound.describe()));
        return None;
    }

    Some(value)
}

fn categorical<T>(
    map: &Map<String, Value>,
    key: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<T>
where
    T: FromStr<Err = String>,
{
    let Some(raw) = present(map, key) else {
        violations.push(FieldViolation::new(key, "is required"));
        return None;
    };

    let Some(text) = raw.as_str() else {
        violations.push(FieldViolation::new(key, "must be a string"));
        return None;
    };

    match text.parse::<T>() {
        Ok(value) => Some(value),
        Err(reason) => {
            violations.push(FieldViolation::new(key, reason));
            None
        }
    }
}

fn optional_user_id(
    map: &Map<String, Value>,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    let raw = present(map, "userId")?;

    let id = match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) if n.is_u64() || n.is_i64() => n.to_string(),
        _ => {
            violations.push(FieldViolation::new("userId", "must be a string"));
            return None;
        }
    };

    if id.is_empty() || id.len() > MAX_USER_ID_LEN {
        violations.push(FieldViolation::new(
            "userId",
            format!("must be between 1 and {} characters", MAX_USER_ID_LEN),
        ));
        return None;
    }

    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_payload() -> Value {
        json!({
            "cropType": "Wheat",
            "farmArea": 10,
            "soilType": "Loamy",
            "soilPh": 6.5,
            "waterUsage": 4000,
            "fertilizer": 2.0,
            "temperature": 25,
            "humidity": 65
        })
    }

    #[test]
    fn test_valid_payload_builds_record() {
        let record = FeatureValidator::validate(&valid_payload()).expect("valid");
        assert_eq!(record.crop_type(), CropType::Wheat);
        assert_eq!(record.soil_type(), SoilType::Loamy);
        assert_eq!(record.farm_area(), 10.0);
        assert_eq!(record.humidity(), 65.0);
        assert_eq!(record.user_id(), None);
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let mut payload = valid_payload();
        payload["farmArea"] = json!(" 12.5 ");
        payload["soilPh"] = json!("7");
        let record = FeatureValidator::validate(&payload).expect("valid");
        assert_eq!(record.farm_area(), 12.5);
        assert_eq!(record.soil_ph(), 7.0);
    }

    #[test]
    fn test_out_of_range_ph_reports_single_violation() {
        let mut payload = valid_payload();
        payload["soilPh"] = json!(15);
        let err = FeatureValidator::validate(&payload).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].field, "soilPh");
    }

    #[test]
    fn test_zero_farm_area_is_rejected() {
        let mut payload = valid_payload();
        payload["farmArea"] = json!(0);
        let err = FeatureValidator::validate(&payload).unwrap_err();
        assert_eq!(err.fields().collect::<Vec<_>>(), vec!["farmArea"]);
    }

    #[test]
    fn test_collects_every_violation() {
        let payload = json!({
            "cropType": "Barley",
            "soilType": 3,
            "soilPh": "acidic",
            "waterUsage": -1,
            "fertilizer": true,
            "temperature": 25,
            "humidity": 101
        });
        let err = FeatureValidator::validate(&payload).unwrap_err();
        let fields: Vec<&str> = err.fields().collect();
        assert_eq!(
            fields,
            vec![
                "cropType",
                "farmArea",
                "soilType",
                "soilPh",
                "waterUsage",
                "fertilizer",
                "humidity"
            ]
        );
        assert_eq!(err.violations[1].reason, "is required");
        assert_eq!(err.violations[3].reason, "must be a number");
    }

    #[test]
    fn test_null_and_non_finite_values() {
        let mut payload = valid_payload();
        payload["temperature"] = Value::Null;
        payload["humidity"] = json!("NaN");
        let err = FeatureValidator::validate(&payload).unwrap_err();
        assert_eq!(err.violations[0], FieldViolation::new("temperature", "is required"));
        assert_eq!(err.violations[1], FieldViolation::new("humidity", "must be a number"));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let mut payload = valid_payload();
        payload["irrigationType"] = json!("Drip");
        payload["notes"] = json!({"anything": [1, 2, 3]});
        assert!(FeatureValidator::validate(&payload).is_ok());
    }

    #[test]
    fn test_user_id_rules() {
        let mut payload = valid_payload();
        payload["userId"] = json!("  farmer-7 ");
        let record = FeatureValidator::validate(&payload).expect("valid");
        assert_eq!(record.user_id(), Some("farmer-7"));

        payload["userId"] = json!(42);
        let record = FeatureValidator::validate(&payload).expect("valid");
        assert_eq!(record.user_id(), Some("42"));

        payload["userId"] = json!("");
        let err = FeatureValidator::validate(&payload).unwrap_err();
        assert_eq!(err.violations[0].field, "userId");
    }

    #[test]
    fn test_conditions_ignore_crop_specific_fields() {
        let conditions = FeatureValidator::validate_conditions(&json!({
            "farmArea": 4,
            "soilType": "clay",
            "soilPh": 6.2,
            "temperature": 30,
            "humidity": 80,
            "cropType": "Barley",
            "waterUsage": -5
        }))
        .expect("valid");
        assert_eq!(conditions.soil_type(), SoilType::Clay);
        assert_eq!(conditions.farm_area(), 4.0);
    }

    #[test]
    fn test_conditions_collect_violations() {
        let err = FeatureValidator::validate_conditions(&json!({
            "farmArea": 2000,
            "soilType": "Peat",
            "soilPh": 6.0,
            "humidity": 50
        }))
        .unwrap_err();
        assert_eq!(
            err.fields().collect::<Vec<_>>(),
            vec!["farmArea", "soilType", "temperature"]
        );
    }

    #[test]
    fn test_non_object_body() {
        let err = FeatureValidator::validate(&json!([1, 2])).unwrap_err();
        assert_eq!(err.violations, vec![FieldViolation::new("body", "must be a JSON object")]);
    }
}

use super::predictor::{SuitabilityEstimator, YieldEstimate, YieldEstimator};
use crate::domain::errors::{ModelError, ModelLoadError};
use crate::domain::features::{FeatureRecord, features_to_vector};
use crate::domain::prediction::{ModelKind, PredictionSource, SuitabilityLabel};
use smartcore::ensemble::random_forest_classifier::RandomForestClassifier;
use smartcore::ensemble::random_forest_regressor::RandomForestRegressor;
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::path::Path;

/// Serialized yield pipeline: predicts tonnes per hectare.
pub type YieldForest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Serialized suitability pipeline: predicts a class id (see `SuitabilityLabel::from_class_id`).
pub type SuitabilityForest = RandomForestClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>;

fn input_matrix(record: &FeatureRecord, kind: ModelKind) -> Result<DenseMatrix<f64>, ModelError> {
    let input_vec = features_to_vector(record);
    DenseMatrix::from_2d_vec(&vec![input_vec]).map_err(|e| ModelError::Inference {
        kind,
        reason: format!("Matrix creation failed: {}", e),
    })
}

fn decode<T: serde::de::DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T, ModelLoadError> {
    serde_json::from_slice(bytes).map_err(|e| ModelLoadError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub struct SmartCoreYieldModel {
    model: YieldForest,
    confidence: f64,
}

impl SmartCoreYieldModel {
    /// `confidence` is the certainty reported alongside every estimate, taken
    /// from the training metadata. It is clamped into [0, 1].
    pub fn new(model: YieldForest, confidence: f64) -> Self {
        Self {
            model,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn from_json_bytes(
        path: &Path,
        bytes: &[u8],
        confidence: f64,
    ) -> Result<Self, ModelLoadError> {
        Ok(Self::new(decode(path, bytes)?, confidence))
    }
}

impl YieldEstimator for SmartCoreYieldModel {
    fn estimate(&self, record: &FeatureRecord) -> Result<YieldEstimate, ModelError> {
        let input = input_matrix(record, ModelKind::Yield)?;
        let predictions = self.model.predict(&input).map_err(|e| ModelError::Inference {
            kind: ModelKind::Yield,
            reason: format!("Prediction failed: {}", e),
        })?;

        let per_hectare = predictions.first().copied().ok_or(ModelError::Inference {
            kind: ModelKind::Yield,
            reason: "No prediction returned".to_string(),
        })?;

        if !per_hectare.is_finite() {
            return Err(ModelError::Inference {
                kind: ModelKind::Yield,
                reason: format!("Non-finite prediction: {}", per_hectare),
            });
        }

        Ok(YieldEstimate {
            tonnes: per_hectare.max(0.0) * record.farm_area(),
            confidence: self.confidence,
        })
    }

    fn source(&self) -> PredictionSource {
        PredictionSource::Model
    }

    fn name(&self) -> &str {
        "SmartCore Random Forest Regressor"
    }
}

pub struct SmartCoreSuitabilityModel {
    model: SuitabilityForest,
}

impl SmartCoreSuitabilityModel {
    pub fn new(model: SuitabilityForest) -> Self {
        Self { model }
    }

    pub fn from_json_bytes(path: &Path, bytes: &[u8]) -> Result<Self, ModelLoadError> {
        Ok(Self::new(decode(path, bytes)?))
    }
}

impl SuitabilityEstimator for SmartCoreSuitabilityModel {
    fn classify(&self, record: &FeatureRecord) -> Result<SuitabilityLabel, ModelError> {
        let input = input_matrix(record, ModelKind::Suitability)?;
        let predictions = self.model.predict(&input).map_err(|e| ModelError::Inference {
            kind: ModelKind::Suitability,
            reason: format!("Prediction failed: {}", e),
        })?;

        let class_id = predictions.first().copied().ok_or(ModelError::Inference {
            kind: ModelKind::Suitability,
            reason: "No prediction returned".to_string(),
        })?;

        SuitabilityLabel::from_class_id(class_id).ok_or(ModelError::Inference {
            kind: ModelKind::Suitability,
            reason: format!("Unknown class id {}", class_id),
        })
    }

    fn source(&self) -> PredictionSource {
        PredictionSource::Model
    }

    fn name(&self) -> &str {
        "SmartCore Random Forest Classifier"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::features::{FEATURE_NAMES, sample_record};
    use smartcore::ensemble::random_forest_classifier::RandomForestClassifierParameters;
    use smartcore::ensemble::random_forest_regressor::RandomForestRegressorParameters;

    fn training_rows() -> (DenseMatrix<f64>, Vec<f64>, Vec<i32>) {
        let sample = features_to_vector(&sample_record());
        let mut rows = Vec::new();
        let mut yields = Vec::new();
        let mut classes = Vec::new();
        for i in 0..20 {
            let mut row = sample.clone();
            row[1] = 5.0 + i as f64 * 0.15; // soil_ph
            rows.push(row);
            yields.push(3.0 + (i % 5) as f64 * 0.1);
            classes.push(if i < 10 { 1 } else { 3 });
        }
        assert_eq!(rows[0].len(), FEATURE_NAMES.len());
        (DenseMatrix::from_2d_vec(&rows).unwrap(), yields, classes)
    }

    #[test]
    fn test_yield_model_scales_by_area() {
        let (x, y, _) = training_rows();
        let forest = YieldForest::fit(
            &x,
            &y,
            RandomForestRegressorParameters::default().with_n_trees(5),
        )
        .unwrap();
        let model = SmartCoreYieldModel::new(forest, 1.7);

        let estimate = model.estimate(&sample_record()).unwrap();
        assert!(estimate.tonnes > 0.0);
        // Trained targets are per hectare between 3.0 and 3.4; the sample farm has 10 ha
        assert!(estimate.tonnes >= 29.9 && estimate.tonnes <= 34.1);
        assert_eq!(estimate.confidence, 1.0);
    }

    #[test]
    fn test_suitability_model_maps_class_ids() {
        let (x, _, classes) = training_rows();
        let forest = SuitabilityForest::fit(
            &x,
            &classes,
            RandomForestClassifierParameters::default().with_n_trees(5),
        )
        .unwrap();
        let model = SmartCoreSuitabilityModel::new(forest);

        let label = model.classify(&sample_record()).unwrap();
        assert!(matches!(label, SuitabilityLabel::Medium | SuitabilityLabel::Excellent));
    }

    #[test]
    fn test_corrupt_bytes_are_rejected() {
        let result =
            SmartCoreYieldModel::from_json_bytes(Path::new("yield_model.json"), b"not json", 0.9);
        assert!(matches!(result, Err(ModelLoadError::Corrupt { .. })));
    }
}

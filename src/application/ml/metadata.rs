use crate::domain::errors::ModelLoadError;
use crate::domain::features::FEATURE_NAMES;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Yield confidence assumed when the descriptor carries no R² score.
pub const DEFAULT_YIELD_CONFIDENCE: f64 = 0.85;

/// Descriptor written next to the model artifacts by the training job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub version: String,
    pub training_date: NaiveDate,
    /// Must equal `FEATURE_NAMES`, in order
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub regression_r2: Option<f64>,
    #[serde(default)]
    pub classification_accuracy: Option<f64>,
    /// artifact file name -> lowercase hex SHA-256
    #[serde(default)]
    pub checksums: BTreeMap<String, String>,
}

impl ModelMetadata {
    /// Rejects a descriptor whose feature schema differs from the one the
    /// validator produces.
    pub fn check_schema(&self) -> Result<(), ModelLoadError> {
        if self.feature_names.len() != FEATURE_NAMES.len() {
            return Err(ModelLoadError::SchemaMismatch {
                detail: format!(
                    "expected {} features, artifact declares {}",
                    FEATURE_NAMES.len(),
                    self.feature_names.len()
                ),
            });
        }

        if let Some((i, (found, expected))) = self
            .feature_names
            .iter()
            .zip(FEATURE_NAMES.iter())
            .enumerate()
            .find(|(_, (found, expected))| found.as_str() != **expected)
        {
            return Err(ModelLoadError::SchemaMismatch {
                detail: format!(
                    "feature #{} is '{}', expected '{}'",
                    i, found, expected
                ),
            });
        }

        Ok(())
    }

    /// Verifies `bytes` against the recorded checksum, if one exists for `artifact`.
    pub fn verify_checksum(&self, artifact: &str, bytes: &[u8]) -> Result<(), ModelLoadError> {
        let Some(expected) = self.checksums.get(artifact) else {
            return Ok(());
        };

        let actual = sha256_hex(bytes);
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(ModelLoadError::ChecksumMismatch {
                artifact: artifact.to_string(),
                expected: expected.clone(),
                actual,
            });
        }
        Ok(())
    }

    /// Confidence reported by the trained yield model.
    pub fn yield_confidence(&self) -> f64 {
        self.regression_r2
            .filter(|r2| r2.is_finite())
            .map(|r2| r2.clamp(0.0, 1.0))
            .unwrap_or(DEFAULT_YIELD_CONFIDENCE)
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

//! Shared fixtures: tiny trained forests written to a throwaway models
//! directory, plus canonical requests.

#![allow(dead_code)]

use chrono::NaiveDate;
use cropwise::application::ml::ModelPaths;
use cropwise::application::ml::metadata::{ModelMetadata, sha256_hex};
use cropwise::application::ml::model_registry::{
    METADATA_ARTIFACT, SUITABILITY_ARTIFACT, YIELD_ARTIFACT,
};
use cropwise::application::ml::smartcore_predictor::{SuitabilityForest, YieldForest};
use cropwise::domain::features::{FEATURE_NAMES, features_to_vector};
use cropwise::domain::validation::FeatureValidator;
use serde_json::{Value, json};
use smartcore::ensemble::random_forest_classifier::RandomForestClassifierParameters;
use smartcore::ensemble::random_forest_regressor::RandomForestRegressorParameters;
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const MODEL_VERSION: &str = "test-2025.1";
pub const MODEL_R2: f64 = 0.9;

pub fn wheat_request() -> Value {
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

/// Temporary directory removed on drop.
pub struct TempDir {
    pub path: PathBuf,
}

impl TempDir {
    pub fn new(prefix: &str) -> Self {
        let path = std::env::temp_dir().join(format!("{}-{}", prefix, Uuid::new_v4()));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

fn training_set() -> (DenseMatrix<f64>, Vec<f64>, Vec<i32>) {
    let mut rows = Vec::new();
    let mut yields = Vec::new();
    let mut classes = Vec::new();

    for i in 0..24 {
        let ph = 5.0 + (i % 8) as f64 * 0.4;
        let request = json!({
            "cropType": (["Wheat", "Rice", "Maize"][i % 3]),
            "farmArea": 5 + i,
            "soilType": (["Loamy", "Clay", "Alluvial", "Sandy"][i % 4]),
            "soilPh": ph,
            "waterUsage": 3000 + 250 * i,
            "fertilizer": 1.5 + (i % 4) as f64 * 0.25,
            "temperature": 22 + (i % 6),
            "humidity": 55 + (i % 5) * 5
        });
        let record = FeatureValidator::validate(&request).unwrap();
        rows.push(features_to_vector(&record));
        yields.push(3.0 + (i % 6) as f64 * 0.2);
        classes.push((i % 4) as i32);
    }

    (DenseMatrix::from_2d_vec(&rows).unwrap(), yields, classes)
}

pub fn metadata(checksums: BTreeMap<String, String>) -> ModelMetadata {
    ModelMetadata {
        version: MODEL_VERSION.to_string(),
        training_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        regression_r2: Some(MODEL_R2),
        classification_accuracy: Some(0.8),
        checksums,
    }
}

/// Fit both forests and write them, with a checksummed descriptor, into `dir`.
pub fn write_artifacts(dir: &Path) {
    let (x, y, classes) = training_set();

    let yield_forest = YieldForest::fit(
        &x,
        &y,
        RandomForestRegressorParameters::default().with_n_trees(5),
    )
    .unwrap();
    let suitability_forest = SuitabilityForest::fit(
        &x,
        &classes,
        RandomForestClassifierParameters::default().with_n_trees(5),
    )
    .unwrap();

    let yield_bytes = serde_json::to_vec(&yield_forest).unwrap();
    let suitability_bytes = serde_json::to_vec(&suitability_forest).unwrap();

    let checksums = BTreeMap::from([
        (YIELD_ARTIFACT.to_string(), sha256_hex(&yield_bytes)),
        (SUITABILITY_ARTIFACT.to_string(), sha256_hex(&suitability_bytes)),
    ]);

    std::fs::write(dir.join(YIELD_ARTIFACT), yield_bytes).unwrap();
    std::fs::write(dir.join(SUITABILITY_ARTIFACT), suitability_bytes).unwrap();
    write_metadata(dir, &metadata(checksums));
}

pub fn write_metadata(dir: &Path, metadata: &ModelMetadata) {
    std::fs::write(
        dir.join(METADATA_ARTIFACT),
        serde_json::to_vec_pretty(metadata).unwrap(),
    )
    .unwrap();
}

pub fn read_metadata(dir: &Path) -> ModelMetadata {
    serde_json::from_slice(&std::fs::read(dir.join(METADATA_ARTIFACT)).unwrap()).unwrap()
}

/// A models directory with freshly trained artifacts.
pub fn trained_models() -> (TempDir, ModelPaths) {
    let dir = TempDir::new("cropwise-models");
    write_artifacts(&dir.path);
    let paths = ModelPaths::new(&dir.path);
    (dir, paths)
}

/// Everything in the payload except the timestamp, which differs per call.
pub fn payload(envelope: &Value) -> Value {
    envelope["payload"].clone()
}

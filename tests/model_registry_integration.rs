mod common;

use common::{MODEL_VERSION, TempDir, read_metadata, trained_models, write_metadata};
use cropwise::application::ml::model_registry::{METADATA_ARTIFACT, YIELD_ARTIFACT};
use cropwise::application::ml::{ModelPaths, ModelRegistry, RegistryHandle};
use cropwise::domain::errors::ModelLoadError;
use cropwise::domain::prediction::ModelKind;
use std::sync::Arc;

#[test]
fn test_load_trained_artifacts() {
    let (_dir, paths) = trained_models();
    let registry = ModelRegistry::load(&paths).unwrap();

    assert!(registry.available(ModelKind::Yield));
    assert!(registry.available(ModelKind::Suitability));
    assert_eq!(registry.version(), Some(MODEL_VERSION));
    assert!(registry.metadata().unwrap().classification_accuracy.is_some());
}

#[test]
fn test_disabled_kind_is_not_loaded() {
    let (_dir, mut paths) = trained_models();
    paths.suitability_enabled = false;
    let registry = ModelRegistry::load(&paths).unwrap();

    assert!(!registry.available(ModelKind::Suitability));
    assert!(registry.available(ModelKind::Yield));
}

#[test]
fn test_schema_mismatch_is_fatal() {
    let (dir, paths) = trained_models();
    let mut metadata = read_metadata(&dir.path);
    metadata.feature_names.swap(2, 3);
    write_metadata(&dir.path, &metadata);

    assert!(matches!(
        ModelRegistry::load(&paths),
        Err(ModelLoadError::SchemaMismatch { .. })
    ));
}

#[test]
fn test_tampered_artifact_fails_checksum() {
    let (dir, paths) = trained_models();
    let path = dir.join(YIELD_ARTIFACT);
    let mut bytes = std::fs::read(&path).unwrap();
    bytes.push(b' ');
    std::fs::write(&path, bytes).unwrap();

    match ModelRegistry::load(&paths) {
        Err(ModelLoadError::ChecksumMismatch { artifact, .. }) => {
            assert_eq!(artifact, YIELD_ARTIFACT)
        }
        other => panic!("expected checksum mismatch, got {:?}", other.err()),
    }
}

#[test]
fn test_corrupt_artifact_without_checksum() {
    let (dir, paths) = trained_models();
    let mut metadata = read_metadata(&dir.path);
    metadata.checksums.clear();
    write_metadata(&dir.path, &metadata);
    std::fs::write(dir.join(YIELD_ARTIFACT), b"{ not a forest").unwrap();

    assert!(matches!(
        ModelRegistry::load(&paths),
        Err(ModelLoadError::Corrupt { .. })
    ));
}

#[test]
fn test_missing_metadata() {
    let dir = TempDir::new("cropwise-empty");
    let paths = ModelPaths::new(&dir.path);

    match ModelRegistry::load(&paths) {
        Err(ModelLoadError::MissingArtifact { path, .. }) => {
            assert!(path.ends_with(METADATA_ARTIFACT))
        }
        other => panic!("expected missing artifact, got {:?}", other.err()),
    }
}

#[test]
fn test_failed_reload_keeps_previous_registry() {
    let (dir, paths) = trained_models();
    let handle = RegistryHandle::new(ModelRegistry::load(&paths).unwrap());
    let before = handle.current();

    std::fs::remove_file(dir.join(YIELD_ARTIFACT)).unwrap();
    assert!(handle.reload(&paths).is_err());

    let after = handle.current();
    assert!(Arc::ptr_eq(&before, &after));
    assert!(after.available(ModelKind::Yield));
}

#[test]
fn test_successful_reload_swaps_registry() {
    let (_dir, paths) = trained_models();
    let handle = RegistryHandle::new(ModelRegistry::fallback_only());
    let before = handle.current();

    handle.reload(&paths).unwrap();

    let after = handle.current();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.version(), Some(MODEL_VERSION));
    // Snapshots taken before the swap keep working
    assert!(!before.available(ModelKind::Yield));
}

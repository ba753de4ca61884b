use crate::domain::prediction::ModelKind;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// One violated constraint on one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub reason: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

fn describe(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{} {}", v.field, v.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Bad or missing request input. Carries every violation, not just the first.
#[derive(Debug, Clone, Error)]
#[error("Validation failed: {}", describe(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.violations.iter().map(|v| v.field.as_str())
    }
}

/// Startup-fatal problems with the model artifacts.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("{artifact} artifact not found at {path:?}")]
    MissingArtifact { artifact: String, path: PathBuf },

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact {path:?} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Checksum mismatch for {artifact}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        artifact: String,
        expected: String,
        actual: String,
    },

    #[error("Feature schema mismatch: {detail}")]
    SchemaMismatch { detail: String },

    #[error("No model directory configured")]
    NoModelDirectory,
}

/// Request-time model failures. Never surfaced to callers; the orchestrator
/// substitutes the fallback heuristic.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("{kind} model is not available")]
    Unavailable { kind: ModelKind },

    #[error("{kind} inference failed: {reason}")]
    Inference { kind: ModelKind, reason: String },
}

/// Persistence failures. Absorbed by the gateway.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Storage write timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Enabled by configuration but unreachable since startup
    #[error("Storage is unavailable")]
    Unavailable,

    #[error("Storage backend failure: {0}")]
    Backend(String),
}

/// Anything the orchestrator cannot recover from.
#[derive(Debug, Clone, Error)]
pub enum PredictionError {
    #[error("Unexpected prediction failure: {0}")]
    Unexpected(String),
}

/// Caller-facing error taxonomy carried in error envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    ModelUnavailable,
    ModelLoadError,
    StorageError,
    UnexpectedError,
}

impl ErrorCode {
    /// HTTP status the web layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 400,
            // Degraded, but the request itself succeeded
            ErrorCode::ModelUnavailable | ErrorCode::StorageError => 200,
            ErrorCode::ModelLoadError => 503,
            ErrorCode::UnexpectedError => 500,
        }
    }
}

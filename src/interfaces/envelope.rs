//! Uniform response shape returned to the web layer.
//!
//! Every request ends in exactly one envelope. Error messages are fixed
//! strings or validation detail; storage and model internals are logged
//! server-side and never copied in here.

use crate::domain::errors::{ErrorCode, FieldViolation, ModelLoadError, ValidationError};
use crate::domain::prediction::PredictionResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};

pub const PREDICTION_MESSAGE: &str = "Yield prediction generated successfully";
pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred while processing the prediction";
pub const MODEL_LOAD_MESSAGE: &str = "Prediction models are not available";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ResponseEnvelope {
    Success {
        message: String,
        payload: Value,
        timestamp: DateTime<Utc>,
    },
    Error {
        message: String,
        error_code: ErrorCode,
        #[serde(skip_serializing_if = "Option::is_none")]
        errors: Option<Vec<FieldViolation>>,
        timestamp: DateTime<Utc>,
    },
}

impl ResponseEnvelope {
    pub fn success(
        message: impl Into<String>,
        payload: &impl Serialize,
    ) -> Result<Self, serde_json::Error> {
        Ok(ResponseEnvelope::Success {
            message: message.into(),
            payload: serde_json::to_value(payload)?,
            timestamp: Utc::now(),
        })
    }

    pub fn prediction(result: &PredictionResult) -> Result<Self, serde_json::Error> {
        Self::success(PREDICTION_MESSAGE, result)
    }

    /// Field-level detail is the one error the caller can act on, so it is
    /// the only one that carries more than a fixed message.
    pub fn validation(error: &ValidationError) -> Self {
        ResponseEnvelope::Error {
            message: error.to_string(),
            error_code: ErrorCode::ValidationError,
            errors: Some(error.violations.clone()),
            timestamp: Utc::now(),
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ResponseEnvelope::Error {
            message: message.into(),
            error_code: code,
            errors: None,
            timestamp: Utc::now(),
        }
    }

    pub fn unexpected() -> Self {
        Self::error(ErrorCode::UnexpectedError, UNEXPECTED_MESSAGE)
    }

    /// Envelope for a failed startup. Only model problems are reported as
    /// `MODEL_LOAD_ERROR`; anything else stays generic.
    pub fn startup_failure(error: &anyhow::Error) -> Self {
        if error.chain().any(|cause| cause.is::<ModelLoadError>()) {
            Self::error(ErrorCode::ModelLoadError, MODEL_LOAD_MESSAGE)
        } else {
            Self::unexpected()
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResponseEnvelope::Success { .. })
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            ResponseEnvelope::Success { .. } => None,
            ResponseEnvelope::Error { error_code, .. } => Some(*error_code),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ResponseEnvelope::Success { message, .. } | ResponseEnvelope::Error { message, .. } => {
                message
            }
        }
    }

    /// Suggested HTTP status for the web layer.
    pub fn http_status(&self) -> u16 {
        self.error_code().map_or(200, |code| code.http_status())
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            json!({
                "status": "error",
                "message": UNEXPECTED_MESSAGE,
                "error_code": ErrorCode::UnexpectedError,
                "timestamp": Utc::now(),
            })
        })
    }
}

//! Narrator Server
//!
//! HTTP surface for the chunked text-to-speech pipeline.

pub mod http;
pub mod init;
pub mod metrics;
pub mod state;
pub mod upload;

pub use http::create_router;
pub use init::{build_loader, run_initialization, spawn_initialization};
pub use self::metrics::{init_metrics, metrics_handler};
pub use state::{AppState, Engine, EngineSnapshot};
pub use upload::{decode_upload, DecodedUpload, UploadError};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use narrator_core::{
    Error, ErrorCode, ModelStatus, QualityProfile, SynthesisError, ValidationError,
};
use serde::Serialize;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Pipeline(#[from] Error),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("{0}")]
    Conflict(String),
}

impl ServerError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ServerError::Pipeline(e) => e.code(),
            ServerError::Upload(UploadError::TooLarge { .. }) => ErrorCode::PayloadTooLarge,
            ServerError::Upload(_) => ErrorCode::UploadRejected,
            ServerError::Conflict(_) => ErrorCode::Conflict,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Pipeline(e) => match e {
                Error::Validation(_) => StatusCode::BAD_REQUEST,
                Error::NotReady { .. } => StatusCode::SERVICE_UNAVAILABLE,
                Error::Uninitialized { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                Error::Synthesis(SynthesisError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
                Error::Synthesis(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::Upload(UploadError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::Upload(_) => StatusCode::BAD_REQUEST,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    fn body(&self) -> ErrorBody {
        let mut body = ErrorBody {
            error: self.to_string(),
            code: self.code(),
            details: None,
            model_status: None,
            available_voices: None,
            available_qualities: None,
        };

        if let ServerError::Pipeline(e) = self {
            body.model_status = e.model_status().cloned();
            match e {
                Error::Validation(ValidationError::UnknownVoice { available, .. }) => {
                    body.available_voices = Some(available.clone());
                }
                Error::Validation(ValidationError::UnknownQuality(_)) => {
                    body.available_qualities =
                        Some(QualityProfile::ALL.iter().map(QualityProfile::as_str).collect());
                }
                Error::Synthesis(SynthesisError::Timeout { .. }) => {
                    body.error = "Speech generation timed out".to_string();
                    body.details = Some(e.to_string());
                }
                Error::Synthesis(inner) => {
                    body.error = "Failed to generate speech".to_string();
                    body.details = Some(inner.to_string());
                }
                _ => {}
            }
        }

        body
    }
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        err.status_code()
    }
}

impl From<ValidationError> for ServerError {
    fn from(err: ValidationError) -> Self {
        ServerError::Pipeline(err.into())
    }
}

/// JSON error body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_status: Option<ModelStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_voices: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_qualities: Option<Vec<&'static str>>,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.body();

        if status.is_server_error() {
            tracing::error!(code = %body.code, status = status.as_u16(), "{}", self);
        } else {
            tracing::debug!(code = %body.code, status = status.as_u16(), "{}", self);
        }
        crate::metrics::record_error(body.code.as_str());

        (status, Json(body)).into_response()
    }
}

//! Error types for the narrator service

use thiserror::Error;

use crate::status::ModelStatus;

/// Main error type for a speech request
#[derive(Error, Debug)]
pub enum Error {
    /// Bad or missing request fields
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Model initialization still running
    #[error("Model is still loading. Please wait...")]
    NotReady { status: ModelStatus },

    /// Model failed to load or was never loaded
    #[error("TTS not initialized. Please check server logs.")]
    Uninitialized { status: ModelStatus },

    /// Backend failure somewhere after validation
    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),
}

/// Request validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Text is required")]
    MissingText,

    #[error("Invalid voice selection: {voice}")]
    UnknownVoice {
        voice: String,
        available: Vec<String>,
    },

    #[error("Invalid quality setting: {0}")]
    UnknownQuality(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

/// Synthesis pipeline errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("malformed model output: {0}")]
    Malformed(String),

    #[error("synthesis timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("no audio segments to assemble")]
    EmptyAudio,

    #[error("model load failed: {0}")]
    Load(String),
}

impl Error {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Validation(ValidationError::MissingText) => ErrorCode::MissingText,
            Error::Validation(ValidationError::UnknownVoice { .. }) => ErrorCode::InvalidVoice,
            Error::Validation(ValidationError::UnknownQuality(_)) => ErrorCode::InvalidQuality,
            Error::Validation(ValidationError::InvalidBody(_)) => ErrorCode::InvalidRequest,
            Error::NotReady { .. } => ErrorCode::ModelLoading,
            Error::Uninitialized { .. } => ErrorCode::ModelUninitialized,
            Error::Synthesis(SynthesisError::Timeout { .. }) => ErrorCode::SynthesisTimeout,
            Error::Synthesis(_) => ErrorCode::SynthesisFailed,
        }
    }

    /// Model status carried by readiness errors
    pub fn model_status(&self) -> Option<&ModelStatus> {
        match self {
            Error::NotReady { status } | Error::Uninitialized { status } => Some(status),
            _ => None,
        }
    }
}

/// Error code reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MissingText,
    InvalidVoice,
    InvalidQuality,
    InvalidRequest,
    ModelLoading,
    ModelUninitialized,
    SynthesisFailed,
    SynthesisTimeout,
    UploadRejected,
    PayloadTooLarge,
    Conflict,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingText => "MISSING_TEXT",
            ErrorCode::InvalidVoice => "INVALID_VOICE",
            ErrorCode::InvalidQuality => "INVALID_QUALITY",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::ModelLoading => "MODEL_LOADING",
            ErrorCode::ModelUninitialized => "MODEL_UNINITIALIZED",
            ErrorCode::SynthesisFailed => "SYNTHESIS_FAILED",
            ErrorCode::SynthesisTimeout => "SYNTHESIS_TIMEOUT",
            ErrorCode::UploadRejected => "UPLOAD_REJECTED",
            ErrorCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ErrorCode::Conflict => "CONFLICT",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let err: Error = ValidationError::MissingText.into();
        assert_eq!(err.code(), ErrorCode::MissingText);

        let err: Error = SynthesisError::Timeout { after_ms: 100 }.into();
        assert_eq!(err.code(), ErrorCode::SynthesisTimeout);
        assert_eq!(err.to_string(), "Synthesis error: synthesis timed out after 100ms");

        let err: Error = SynthesisError::Backend("boom".into()).into();
        assert_eq!(err.code(), ErrorCode::SynthesisFailed);
    }

    #[test]
    fn test_code_serialization_matches_as_str() {
        for code in [ErrorCode::InvalidVoice, ErrorCode::ModelLoading, ErrorCode::PayloadTooLarge] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn test_readiness_errors_carry_status() {
        let err = Error::NotReady {
            status: ModelStatus::starting(),
        };
        assert!(err.model_status().unwrap().loading);

        let err: Error = ValidationError::UnknownQuality("ultra".into()).into();
        assert!(err.model_status().is_none());
    }
}

//! Error types for the theme-weaver pipeline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Extension outside the recognized image/pdf set
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// OCR engine, PDF reader or renderer failure
    #[error("Text extraction failed: {cause}")]
    ExtractionFailed { cause: String },

    /// Persisted session counter could not be parsed
    #[error("Session counter at '{}' is corrupt: {value:?}", .path.display())]
    CounterCorrupt { path: PathBuf, value: String },

    /// Malformed request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Session scope unusable as a storage namespace
    #[error("Invalid session scope: {0}")]
    InvalidSession(String),

    /// Upload larger than the configured limit
    #[error("File '{filename}' is {size} bytes, limit is {limit} bytes")]
    FileTooLarge {
        filename: String,
        size: usize,
        limit: usize,
    },

    /// Completion provider failure or timeout
    #[error("Provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },

    /// No completion provider has a credential
    #[error("No LLM API key configured")]
    NoProviderConfigured,

    /// Knowledge store error
    #[error("Knowledge store error: {0}")]
    Store(String),

    /// Document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an extraction error
    pub fn extraction(cause: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            cause: cause.into(),
        }
    }

    /// Create a provider error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a knowledge store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            Error::UnsupportedFileType(_) => (StatusCode::BAD_REQUEST, "unsupported_type"),
            Error::ExtractionFailed { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "extraction_error")
            }
            Error::CounterCorrupt { .. } => (StatusCode::CONFLICT, "counter_corrupt"),
            Error::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Error::InvalidSession(_) => (StatusCode::BAD_REQUEST, "invalid_session"),
            Error::FileTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "file_too_large"),
            Error::Provider { .. } => (StatusCode::BAD_GATEWAY, "provider_error"),
            Error::NoProviderConfigured => {
                (StatusCode::SERVICE_UNAVAILABLE, "no_provider_configured")
            }
            Error::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
            Error::DocumentNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

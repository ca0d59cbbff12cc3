//! Error types for the store, the HTTP layer and configuration.
//!
//! # Design
//! `StoreError` keeps the "unknown id" case apart from I/O and encoding
//! failures, because only the former is the client's fault. `ApiError` is the
//! HTTP-facing view: every variant maps to one status code and a plain-text
//! body carrying the raw message, with no JSON envelope.

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors returned by `Store` operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No todo with the given id exists.
    #[error("todo {0} not found")]
    NotFound(String),

    /// The backing file could not be read at startup.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file is not a JSON object of todos.
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Writing the snapshot failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Encoding the snapshot failed.
    #[error(transparent)]
    Encode(#[from] serde_json::Error),
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("not found")]
    NotFound,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("need content-type 'application/json', but got '{0}'")]
    UnsupportedMediaType(String),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()).into_response(),
            ApiError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, self.to_string()).into_response()
            }
            ApiError::UnsupportedMediaType(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, self.to_string()).into_response()
            }
            ApiError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(_) => ApiError::NotFound,
            other => {
                tracing::error!(error = %other, "store operation failed");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("PORT must be a number between 0 and 65535, got '{0}'")]
    InvalidPort(String),
}

/**
 * Backend Error Types
 *
 * This module defines the HTTP-facing error type of the backend. Errors on
 * the WebSocket path never become `BackendError`: decode failures are
 * answered in-band and store failures are only logged. `BackendError` covers
 * the upgrade handshake and the REST endpoints.
 *
 * # Error Categories
 *
 * ## Handler Errors
 *
 * Invalid path or query parameters, answered with the status chosen by the
 * handler (usually 400).
 *
 * ## Authentication Errors
 *
 * Missing, invalid or expired credentials. Always 401, with a
 * `WWW-Authenticate: Bearer` header.
 *
 * ## Store Errors
 *
 * Failures of the message store behind the REST endpoints:
 * - `NotFound` - 404
 * - `Unavailable` / `Timeout` - 503
 * - `Database` - 500, details are logged but not returned
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::messaging::StoreError;
use crate::backend::realtime::handshake::HandshakeError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use xfchat::backend::error::BackendError;
/// use axum::http::StatusCode;
///
/// let err = BackendError::handler(StatusCode::BAD_REQUEST, "invalid peer id");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
///
/// let err = BackendError::unauthorized("missing credentials");
/// assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error (e.g., invalid path or query parameter)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// Credentials missing or rejected
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Message store error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new handler error with a status code
    ///
    /// # Arguments
    ///
    /// * `status` - HTTP status code
    /// * `message` - Error message
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `HandlerError` - Uses the status code from the error
    /// - `Unauthorized` - 401 Unauthorized
    /// - `Store` - 404, 503 or 500 depending on the store error
    /// - `SerializationError` - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Store(err) => match err {
                StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                StoreError::Unavailable | StoreError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
                StoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error message
    ///
    /// Database errors are reduced to a generic message.
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::Unauthorized { message } => message.clone(),
            Self::Store(StoreError::Database(_)) => "internal database error".to_string(),
            Self::Store(err) => err.to_string(),
            Self::SerializationError(err) => err.to_string(),
        }
    }
}

impl From<HandshakeError> for BackendError {
    fn from(err: HandshakeError) -> Self {
        Self::unauthorized(err.to_string())
    }
}

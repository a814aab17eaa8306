//! Error Types for the chainread API
//!
//! This module defines error handling for the HTTP layer:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation for Axum HTTP responses
//!
//! Errors are serialized as `{"error": {...}}` with an appropriate status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chainread_core::{ChainError, TransportError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to a specific HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Path segment is not a valid log id
    InvalidLogId,

    /// Path segment or query parameter is not a valid event id
    InvalidEventId,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Requested event does not exist at the origin
    EventNotFound,

    // ========================================================================
    // Server Errors (500, 503)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// Head lookup database failed
    DatabaseError,

    /// Origin event store failed or timed out
    UpstreamError,

    /// Origin returned a record that could not be decoded
    DecodeFailure,

    /// History walk exceeded the configured depth
    ChainTooDeep,

    /// Database connection pool exhausted or closed
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidLogId | ErrorCode::InvalidEventId => StatusCode::BAD_REQUEST,

            ErrorCode::EventNotFound => StatusCode::NOT_FOUND,

            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            ErrorCode::InternalError
            | ErrorCode::DatabaseError
            | ErrorCode::UpstreamError
            | ErrorCode::DecodeFailure
            | ErrorCode::ChainTooDeep => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidLogId => "Invalid log id",
            ErrorCode::InvalidEventId => "Invalid event id",
            ErrorCode::EventNotFound => "Event not found",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database operation failed",
            ErrorCode::UpstreamError => "Origin event store request failed",
            ErrorCode::DecodeFailure => "Origin returned an undecodable record",
            ErrorCode::ChainTooDeep => "Chain exceeds maximum history depth",
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error returned by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Wire envelope for [`ApiError`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ApiError,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors
    // ========================================================================

    pub fn invalid_log_id(value: &str) -> Self {
        Self::from_code(ErrorCode::InvalidLogId)
            .with_details(serde_json::json!({ "value": value }))
    }

    pub fn invalid_event_id(value: &str) -> Self {
        Self::from_code(ErrorCode::InvalidEventId)
            .with_details(serde_json::json!({ "value": value }))
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ErrorBody { error: self })).into_response()
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

/// Map reader failures onto HTTP errors.
///
/// Decode errors reaching this point come from origin records, never from
/// request input, so they are server errors. Handlers validate path and
/// query identifiers themselves.
impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::NotFound { id } => Self::from_code(ErrorCode::EventNotFound)
                .with_details(serde_json::json!({ "eventId": id.to_string() })),
            ChainError::Transport(TransportError::Database { reason }) => {
                tracing::error!(%reason, "Head lookup failed");
                Self::from_code(ErrorCode::DatabaseError)
            }
            ChainError::Transport(e) => {
                tracing::error!(error = %e, "Origin request failed");
                Self::new(ErrorCode::UpstreamError, e.to_string())
            }
            ChainError::Decode(e) => {
                tracing::error!(error = %e, "Origin record rejected");
                Self::new(ErrorCode::DecodeFailure, e.to_string())
            }
            ChainError::DepthExceeded { limit, .. } => Self::from_code(ErrorCode::ChainTooDeep)
                .with_details(serde_json::json!({ "limit": limit })),
            ChainError::Config(e) => Self::internal_error(e.to_string()),
        }
    }
}

/// Convert from tokio_postgres::Error to ApiError.
impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        ApiError::database_error("Database operation failed")
    }
}

/// Convert from deadpool_postgres::PoolError to ApiError.
impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::error!("Connection pool error: {:?}", err);
        match err {
            deadpool_postgres::PoolError::Timeout(_) => {
                ApiError::service_unavailable("Database connection pool exhausted")
            }
            deadpool_postgres::PoolError::Closed => {
                ApiError::service_unavailable("Database connection pool is closed")
            }
            _ => ApiError::database_error("Failed to acquire database connection"),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

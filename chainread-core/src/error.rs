//! Error types for chainread operations

use thiserror::Error;

use crate::identity::EventId;

/// Network and adapter failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request to {service} failed with status {status}: {message}")]
    RequestFailed {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Connection to {service} failed: {reason}")]
    ConnectionFailed { service: String, reason: String },

    #[error("Operation {operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Database error: {reason}")]
    Database { reason: String },
}

/// Malformed identifiers and payloads.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Invalid event id {value:?}: {reason}")]
    InvalidEventId { value: String, reason: String },

    #[error("Invalid log id {value:?}: {reason}")]
    InvalidLogId { value: String, reason: String },

    #[error("Malformed record: {reason}")]
    MalformedRecord { reason: String },

    #[error("Invalid payload encoding: {reason}")]
    InvalidPayload { reason: String },

    #[error("Content mismatch: requested {expected}, content digests to {actual}")]
    ContentMismatch { expected: EventId, actual: EventId },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all chainread errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("Event not found: {id}")]
    NotFound { id: EventId },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Chain from {head} exceeds the depth limit of {limit} events")]
    DepthExceeded { head: EventId, limit: usize },
}

impl ChainError {
    /// Whether this error means the requested resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ChainError::NotFound { .. })
    }
}

/// Result type alias for chainread operations.
pub type ChainResult<T> = Result<T, ChainError>;

// =============================================================================
// TESTS
// =============================================================================

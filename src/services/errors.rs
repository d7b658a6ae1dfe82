//! # Service Error Types
//!
//! Failure taxonomy for calls across the external service seams. The
//! orchestrator only ever asks one question of these errors (retry or not),
//! so classification happens here at the boundary where the underlying cause
//! is still known, and the full detail rides along in the message.

use thiserror::Error;

/// Classified failure from an external collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The resource this call would create is already there. Executors treat
    /// this as success, never as a failure.
    #[error("{resource} already exists: {identifier}")]
    AlreadyExists {
        resource: String,
        identifier: String,
    },

    /// Worth retrying: timeouts, throttling, replication lag, brief outages
    #[error("Transient failure in {operation}: {message}")]
    Transient { operation: String, message: String },

    /// Not worth retrying: rejected input, missing permissions, disabled
    /// features, anything a repeat attempt cannot fix
    #[error("Permanent failure in {operation}: {message}")]
    Permanent { operation: String, message: String },
}

impl ServiceError {
    /// Create an already-exists conflict
    pub fn already_exists(resource: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::AlreadyExists {
            resource: resource.into(),
            identifier: identifier.into(),
        }
    }

    /// Create a transient failure
    pub fn transient(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transient {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a permanent failure
    pub fn permanent(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Permanent {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Whether a repeat attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Whether this is the absorbable already-exists conflict
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

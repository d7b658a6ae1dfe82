//! # Orchestration Error Types
//!
//! Stage-level failure classification plus the invocation-level error type.
//! The orchestrator makes exactly one decision from a [`StageError`]: retry
//! or give up. Everything else about the failure rides along as text for the
//! status report and the logs.

use thiserror::Error;

use crate::services::ServiceError;
use crate::state_machine::TransitionError;
use crate::state_store::StateStoreError;

/// Classified failure from one stage attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// The request itself is unusable; retrying cannot help
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// Worth retrying under the retry policy
    #[error("Transient failure in {stage}: {message}")]
    Transient { stage: String, message: String },

    /// Not worth retrying; the workflow fails with this diagnosis
    #[error("Permanent failure in {stage}: {message}")]
    Permanent { stage: String, message: String },
}

impl StageError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a transient error
    pub fn transient(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transient {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create a permanent error
    pub fn permanent(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Permanent {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Timeout of a stage attempt counts as transient
    pub fn timeout(stage: impl Into<String>, timeout_secs: u64) -> Self {
        let stage = stage.into();
        Self::Transient {
            message: format!("{stage} timed out after {timeout_secs}s"),
            stage,
        }
    }

    /// Map a service failure into a stage failure. Already-exists conflicts
    /// are absorbed as success by executors before this point; one that leaks
    /// through is treated as permanent so it surfaces instead of looping.
    pub fn from_service(stage: impl Into<String>, err: ServiceError) -> Self {
        let stage = stage.into();
        match err {
            ServiceError::Transient { .. } => Self::Transient {
                stage,
                message: err.to_string(),
            },
            ServiceError::Permanent { .. } | ServiceError::AlreadyExists { .. } => {
                Self::Permanent {
                    stage,
                    message: err.to_string(),
                }
            }
        }
    }

    /// Whether the retry policy applies to this failure
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Invocation-level errors: infrastructure trouble rather than workflow
/// outcomes. The service loop logs these and relies on redelivery.
#[derive(Error, Debug)]
pub enum OrchestrationError {
    #[error(transparent)]
    StateStore(#[from] StateStoreError),

    #[error("Transition error: {0}")]
    Transition(#[from] TransitionError),

    #[error("Internal orchestration error: {message}")]
    Internal { message: String },
}

impl OrchestrationError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Result type alias for orchestration operations
pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

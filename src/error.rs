use std::fmt;

use crate::config::ConfigurationError;
use crate::messaging::EnvelopeError;
use crate::models::RequestValidationError;
use crate::orchestration::{OrchestrationError, ScheduleError};
use crate::state_machine::TransitionError;
use crate::state_store::StateStoreError;

/// Crate-wide error type for callers that do not care which layer failed.
/// The layered types underneath keep their structure; this flattens them to
/// an area plus a message at the crate boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum GangwayError {
    StateStoreError(String),
    StateTransitionError(String),
    OrchestrationError(String),
    EnvelopeError(String),
    ValidationError(String),
    ConfigurationError(String),
    SchedulingError(String),
}

impl fmt::Display for GangwayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GangwayError::StateStoreError(msg) => write!(f, "State store error: {msg}"),
            GangwayError::StateTransitionError(msg) => write!(f, "State transition error: {msg}"),
            GangwayError::OrchestrationError(msg) => write!(f, "Orchestration error: {msg}"),
            GangwayError::EnvelopeError(msg) => write!(f, "Envelope error: {msg}"),
            GangwayError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            GangwayError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
            GangwayError::SchedulingError(msg) => write!(f, "Scheduling error: {msg}"),
        }
    }
}

impl std::error::Error for GangwayError {}

impl From<StateStoreError> for GangwayError {
    fn from(err: StateStoreError) -> Self {
        GangwayError::StateStoreError(err.to_string())
    }
}

impl From<TransitionError> for GangwayError {
    fn from(err: TransitionError) -> Self {
        GangwayError::StateTransitionError(err.to_string())
    }
}

impl From<OrchestrationError> for GangwayError {
    fn from(err: OrchestrationError) -> Self {
        GangwayError::OrchestrationError(err.to_string())
    }
}

impl From<EnvelopeError> for GangwayError {
    fn from(err: EnvelopeError) -> Self {
        GangwayError::EnvelopeError(err.to_string())
    }
}

impl From<RequestValidationError> for GangwayError {
    fn from(err: RequestValidationError) -> Self {
        GangwayError::ValidationError(err.to_string())
    }
}

impl From<ConfigurationError> for GangwayError {
    fn from(err: ConfigurationError) -> Self {
        GangwayError::ConfigurationError(err.to_string())
    }
}

impl From<ScheduleError> for GangwayError {
    fn from(err: ScheduleError) -> Self {
        GangwayError::SchedulingError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GangwayError>;

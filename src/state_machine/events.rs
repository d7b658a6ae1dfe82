use serde::{Deserialize, Serialize};

/// Events that can trigger workflow stage transitions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WorkflowEvent {
    /// Begin provisioning for a freshly accepted trigger
    Start,
    /// Directory account confirmed to exist, park until the sync delay elapses
    AccountProvisioned,
    /// Scheduled wake-up arrived, begin the post-sync half
    Resume,
    /// License and tracking provisioning finished
    AccessGranted,
    /// Give up with a terminal error message
    Fail(String),
}

impl WorkflowEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::AccountProvisioned => "account_provisioned",
            Self::Resume => "resume",
            Self::AccessGranted => "access_granted",
            Self::Fail(_) => "fail",
        }
    }

    /// Extract error message if this is a failure event
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Fail(msg) => Some(msg),
            _ => None,
        }
    }

    /// Check if this event represents a terminal transition
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::AccessGranted | Self::Fail(_))
    }

    /// Create a failure event with the given error message
    pub fn fail_with_error(error: impl Into<String>) -> Self {
        Self::Fail(error.into())
    }
}

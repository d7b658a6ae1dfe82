use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle stages of an onboarding workflow.
///
/// A workflow advances strictly forward through the provisioning stages and
/// ends in either `Completed` or `Failed`. `AccountPendingSync` is the parked
/// stage between the two provisioning halves, while the directory account
/// replicates out to the downstream systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    /// Trigger accepted, nothing executed yet
    Received,
    /// Directory account and access-grant copy in progress
    AccountCreating,
    /// Account created, waiting out the directory sync delay
    AccountPendingSync,
    /// License and tracking provisioning in progress
    AccessAssigning,
    /// All stages finished successfully
    Completed,
    /// Workflow gave up after a non-retryable error or retry exhaustion
    Failed,
}

impl WorkflowStage {
    /// Check if this is a terminal stage (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check if this stage represents a failure outcome
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Check if this is an active stage (an executor may be running)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::AccountCreating | Self::AccessAssigning)
    }

    /// Check if the directory account has been confirmed to exist by this
    /// stage. Gates everything that must not run before account creation.
    pub fn account_exists(&self) -> bool {
        matches!(
            self,
            Self::AccountPendingSync | Self::AccessAssigning | Self::Completed
        )
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Received => write!(f, "received"),
            Self::AccountCreating => write!(f, "account_creating"),
            Self::AccountPendingSync => write!(f, "account_pending_sync"),
            Self::AccessAssigning => write!(f, "access_assigning"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for WorkflowStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(Self::Received),
            "account_creating" => Ok(Self::AccountCreating),
            "account_pending_sync" => Ok(Self::AccountPendingSync),
            "access_assigning" => Ok(Self::AccessAssigning),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid workflow stage: {s}")),
        }
    }
}

/// New workflows start in `Received`
impl Default for WorkflowStage {
    fn default() -> Self {
        Self::Received
    }
}

//! # Workflow State Store
//!
//! Persistence seam for [`WorkflowState`], the system's only shared mutable
//! resource. All writes are optimistic: callers present the version they
//! loaded, and the store accepts the write only if nobody got there first.
//! A losing writer gets [`StateStoreError::VersionConflict`] and is expected
//! to drop its work, not merge.
//!
//! Two implementations ship here: a DashMap-backed in-memory store for tests
//! and single-process deployments, and a Postgres store (feature `postgres`)
//! for anything that has to survive a restart.
//!
//! ## Example
//!
//! ```rust
//! use gangway::models::{EmployeeData, OnboardingRequest, WorkflowState};
//! use gangway::state_machine::WorkflowStage;
//! use gangway::state_store::{InMemoryStateStore, WorkflowStateStore};
//!
//! # tokio_test::block_on(async {
//! let request = OnboardingRequest::from_parts(
//!     "HR-42",
//!     EmployeeData {
//!         full_name: Some("Jane Smith".to_string()),
//!         department: Some("Engineering".to_string()),
//!         ..Default::default()
//!     },
//! )
//! .unwrap();
//!
//! let store = InMemoryStateStore::new();
//! store.insert_new(&WorkflowState::new(request)).await.unwrap();
//!
//! let record = store.load("HR-42").await.unwrap().unwrap();
//! assert_eq!(record.stage, WorkflowStage::Received);
//! # });
//! ```
//!
//! [`WorkflowState`]: crate::models::WorkflowState

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::WorkflowState;

pub use memory::InMemoryStateStore;
#[cfg(feature = "postgres")]
pub use postgres::PgStateStore;

/// Errors from workflow state persistence
#[derive(Error, Debug)]
pub enum StateStoreError {
    #[error("No workflow state for ticket: {ticket_key}")]
    NotFound { ticket_key: String },

    #[error("Workflow state already exists for ticket: {ticket_key}")]
    AlreadyExists { ticket_key: String },

    #[error("Version conflict for ticket {ticket_key}: version {expected} was already overwritten")]
    VersionConflict { ticket_key: String, expected: i64 },

    #[error("State serialization error: {message}")]
    Serialization { message: String },

    #[error("Store backend error: {operation}: {message}")]
    Backend { operation: String, message: String },
}

impl StateStoreError {
    pub fn not_found(ticket_key: impl Into<String>) -> Self {
        Self::NotFound {
            ticket_key: ticket_key.into(),
        }
    }

    pub fn already_exists(ticket_key: impl Into<String>) -> Self {
        Self::AlreadyExists {
            ticket_key: ticket_key.into(),
        }
    }

    pub fn version_conflict(ticket_key: impl Into<String>, expected: i64) -> Self {
        Self::VersionConflict {
            ticket_key: ticket_key.into(),
            expected,
        }
    }

    pub fn backend(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Conflicts mean another invocation won the race; callers back off
    /// instead of treating it as a fault
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. } | Self::AlreadyExists { .. })
    }
}

impl From<serde_json::Error> for StateStoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StateStoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::backend("query", err.to_string())
    }
}

/// Result type alias for state store operations
pub type StateStoreResult<T> = Result<T, StateStoreError>;

/// Keyed compare-and-set persistence for workflow records
#[async_trait]
pub trait WorkflowStateStore: Send + Sync {
    /// Load the current record for a ticket, if one exists
    async fn load(&self, ticket_key: &str) -> StateStoreResult<Option<WorkflowState>>;

    /// Insert the initial record. Fails with `AlreadyExists` when the ticket
    /// already has a workflow, which is how duplicate triggers lose the race.
    async fn insert_new(&self, state: &WorkflowState) -> StateStoreResult<()>;

    /// Write `state` only if the stored version still equals
    /// `state.version`, bumping the version in the same step. Returns the
    /// record as stored.
    async fn compare_and_update(&self, state: &WorkflowState) -> StateStoreResult<WorkflowState>;
}

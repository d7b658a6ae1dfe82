#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Gangway
//!
//! Event-driven orchestrator for employee onboarding workflows.
//!
//! ## Overview
//!
//! Gangway sits between a ticketing system's automation and the account
//! infrastructure. An approved onboarding ticket publishes a trigger; the
//! orchestrator creates the directory account in the right organizational
//! placement, copies access grants from a template user, waits out the
//! directory sync window, then assigns the license and tracking account and
//! reports progress back to the ticket at every step.
//!
//! ## Architecture
//!
//! Delivery is at-least-once everywhere, so the whole engine is built around
//! redelivery safety: stages check for their resource before creating it,
//! workflow state advances through a compare-and-set store keyed by ticket,
//! and duplicate or stale events drop out as no-ops. The sync window between
//! the two provisioning halves is bridged by scheduled wake-up messages
//! rather than an in-process wait, which keeps invocations short-lived.
//!
//! ## Module Organization
//!
//! - [`models`] - Request validation, identity derivation and the workflow record
//! - [`state_machine`] - Stages, events and the transition table
//! - [`routing`] - Rule-based organizational placement
//! - [`messaging`] - Inbound envelope decoding
//! - [`services`] - Trait seams for the external collaborators
//! - [`state_store`] - Compare-and-set persistence for workflow records
//! - [`orchestration`] - Stage executors, scheduler, reporter and the engine itself
//! - [`config`] - Configuration management
//! - [`error`] - Crate-level error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gangway::config::GangwayConfig;
//! use gangway::messaging::parse_inbound;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GangwayConfig::default();
//! config.validate()?;
//!
//! let raw = r#"{"ticketKey": "HR-42", "employeeData": {"fullName": "Jane Smith", "department": "Engineering"}}"#;
//! let event = parse_inbound(raw)?;
//! println!("accepted {} event for {}", event.kind(), event.ticket_key());
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! Unit tests live beside the code; workflow scenarios run end to end against
//! in-memory fakes:
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # All tests including workflow scenarios
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod orchestration;
pub mod routing;
pub mod services;
pub mod state_machine;
pub mod state_store;

pub use config::{ConfigManager, GangwayConfig, RetryPolicy};
pub use error::{GangwayError, Result};
pub use messaging::{parse_inbound, InboundEvent, ResumeEnvelope, TriggerEnvelope};
pub use models::{CanonicalIdentity, OnboardingRequest, WorkflowState};
pub use orchestration::{
    EventSubmitter, InvocationOutcome, OnboardingOrchestrator, OnboardingService,
    ServiceDependencies,
};
pub use routing::{Placement, PlacementRules};
pub use state_machine::{WorkflowEvent, WorkflowStage};
pub use state_store::{InMemoryStateStore, WorkflowStateStore};

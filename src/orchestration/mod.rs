//! # Workflow Orchestration
//!
//! The engine that turns inbound events into workflow progress.
//!
//! ## Components
//!
//! - [`OnboardingOrchestrator`]: per-event decision making against the stored
//!   workflow record
//! - [`StageExecutors`]: the four idempotent provisioning stages
//! - [`ResumeScheduler`]: deferred wake-up delivery for the sync window and
//!   re-scheduled retries
//! - [`StatusReporter`]: best-effort ticket updates and operator escalation
//! - [`OnboardingService`]: channel loop binding all of the above together
//!
//! Stage failures are classified as [`StageError`] at the executor boundary;
//! the orchestrator routes transient ones through the retry budget and turns
//! everything else into a terminal failure with escalation.

pub mod errors;
pub mod orchestrator;
pub mod reporter;
pub mod scheduler;
pub mod service;
pub mod stages;

pub use errors::{OrchestrationError, OrchestrationResult, StageError};
pub use orchestrator::{InvocationOutcome, OnboardingOrchestrator};
pub use reporter::StatusReporter;
pub use scheduler::{InProcessResumeScheduler, PendingResume, ResumeScheduler, ScheduleError};
pub use service::{EventSubmitter, OnboardingService, ServiceDependencies, SubmitError};
pub use stages::{stage_names, StageExecutors, StageOutcome};

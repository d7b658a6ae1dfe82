// State machine module for onboarding workflows
//
// Stage and event definitions plus the pure transition table. Driving the
// machine (loading state, running executors, persisting transitions) lives in
// the orchestration module; everything here is side-effect free.

pub mod events;
pub mod states;
pub mod transitions;

// Re-export main types for convenient access
pub use events::WorkflowEvent;
pub use states::WorkflowStage;
pub use transitions::{next_stage, TransitionError};

// Core data model for onboarding workflows
//
// Immutable request input, derived canonical identity, and the durable
// per-ticket workflow record. Stage and event enums live in state_machine.

pub mod identity;
pub mod request;
pub mod workflow_state;

pub use identity::{canonical_email, username_from_email, CanonicalIdentity, EmailFormat};
pub use request::{EmployeeData, OnboardingRequest, RequestValidationError};
pub use workflow_state::WorkflowState;

use thiserror::Error;

use super::events::WorkflowEvent;
use super::states::WorkflowStage;

/// Error raised when an event is applied to a stage it cannot leave from
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid transition: {event} event not allowed from {from} stage")]
    InvalidTransition { from: WorkflowStage, event: String },
}

impl TransitionError {
    pub fn invalid(from: WorkflowStage, event: &WorkflowEvent) -> Self {
        Self::InvalidTransition {
            from,
            event: event.event_type().to_string(),
        }
    }
}

/// Determine the target stage for an event applied to the current stage.
///
/// This is the complete transition table. It is a pure function so the table
/// can be tested exhaustively without any store or executor in play; callers
/// persist the result themselves.
pub fn next_stage(
    current: WorkflowStage,
    event: &WorkflowEvent,
) -> Result<WorkflowStage, TransitionError> {
    let target = match (current, event) {
        // Forward progress
        (WorkflowStage::Received, WorkflowEvent::Start) => WorkflowStage::AccountCreating,
        (WorkflowStage::AccountCreating, WorkflowEvent::AccountProvisioned) => {
            WorkflowStage::AccountPendingSync
        }
        (WorkflowStage::AccountPendingSync, WorkflowEvent::Resume) => {
            WorkflowStage::AccessAssigning
        }
        (WorkflowStage::AccessAssigning, WorkflowEvent::AccessGranted) => WorkflowStage::Completed,

        // Failure is reachable from every non-terminal stage
        (from, WorkflowEvent::Fail(_)) if !from.is_terminal() => WorkflowStage::Failed,

        // Invalid transitions
        (from, event) => return Err(TransitionError::invalid(from, event)),
    };

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        assert_eq!(
            next_stage(WorkflowStage::Received, &WorkflowEvent::Start).unwrap(),
            WorkflowStage::AccountCreating
        );
        assert_eq!(
            next_stage(
                WorkflowStage::AccountCreating,
                &WorkflowEvent::AccountProvisioned
            )
            .unwrap(),
            WorkflowStage::AccountPendingSync
        );
        assert_eq!(
            next_stage(WorkflowStage::AccountPendingSync, &WorkflowEvent::Resume).unwrap(),
            WorkflowStage::AccessAssigning
        );
        assert_eq!(
            next_stage(WorkflowStage::AccessAssigning, &WorkflowEvent::AccessGranted).unwrap(),
            WorkflowStage::Completed
        );
    }

    #[test]
    fn test_fail_from_every_non_terminal_stage() {
        for stage in [
            WorkflowStage::Received,
            WorkflowStage::AccountCreating,
            WorkflowStage::AccountPendingSync,
            WorkflowStage::AccessAssigning,
        ] {
            assert_eq!(
                next_stage(stage, &WorkflowEvent::fail_with_error("boom")).unwrap(),
                WorkflowStage::Failed
            );
        }
    }

    #[test]
    fn test_terminal_stages_reject_all_events() {
        for stage in [WorkflowStage::Completed, WorkflowStage::Failed] {
            for event in [
                WorkflowEvent::Start,
                WorkflowEvent::AccountProvisioned,
                WorkflowEvent::Resume,
                WorkflowEvent::AccessGranted,
                WorkflowEvent::fail_with_error("boom"),
            ] {
                assert!(next_stage(stage, &event).is_err());
            }
        }
    }

    #[test]
    fn test_out_of_order_events_rejected() {
        // Resume before the account exists
        assert!(next_stage(WorkflowStage::Received, &WorkflowEvent::Resume).is_err());
        assert!(next_stage(WorkflowStage::AccountCreating, &WorkflowEvent::Resume).is_err());
        // Skipping the sync wait
        assert!(next_stage(
            WorkflowStage::AccountCreating,
            &WorkflowEvent::AccessGranted
        )
        .is_err());
        // Restarting mid-flight
        assert!(next_stage(WorkflowStage::AccessAssigning, &WorkflowEvent::Start).is_err());
    }

    #[test]
    fn test_invalid_transition_error_names_both_sides() {
        let err = next_stage(WorkflowStage::Completed, &WorkflowEvent::Resume).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("resume"));
        assert!(msg.contains("completed"));
    }
}

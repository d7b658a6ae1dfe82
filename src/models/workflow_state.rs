use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::state_machine::WorkflowStage;

use super::request::OnboardingRequest;

/// Durable record of one onboarding workflow, keyed by ticket key.
///
/// This is the only shared mutable resource in the system. Every invocation
/// loads it fresh, and every write goes through the store's compare-and-set
/// on `version`, so two racing invocations for the same ticket cannot both
/// advance the workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    pub ticket_key: String,
    pub stage: WorkflowStage,
    /// Snapshot of the validated trigger input. Deferred re-entry carries
    /// only the ticket key; everything else is re-read from here.
    pub request: OnboardingRequest,
    /// Attempt counter per stage, incremented before each attempt
    #[serde(default)]
    pub attempts: HashMap<WorkflowStage, u32>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Compare-and-set token, bumped by the store on every successful write
    pub version: i64,
}

impl WorkflowState {
    /// Create the initial record for a freshly validated trigger
    pub fn new(request: OnboardingRequest) -> Self {
        let now = Utc::now();
        Self {
            ticket_key: request.ticket_key.clone(),
            stage: WorkflowStage::Received,
            request,
            attempts: HashMap::new(),
            last_attempt_at: None,
            last_error: None,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    /// Attempts made so far for a stage
    pub fn attempts_for(&self, stage: WorkflowStage) -> u32 {
        self.attempts.get(&stage).copied().unwrap_or(0)
    }

    /// Increment the attempt counter for a stage and return the new count.
    /// Callers persist this before running the attempt so a crash mid-stage
    /// still shows up in the counter on redelivery.
    pub fn record_attempt(&mut self, stage: WorkflowStage) -> u32 {
        let count = self.attempts.entry(stage).or_insert(0);
        *count += 1;
        let now = Utc::now();
        self.last_attempt_at = Some(now);
        self.updated_at = now;
        *count
    }

    /// Note the most recent failure without changing stage
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
        self.updated_at = Utc::now();
    }

    /// Move to a new stage. Successful forward progress clears the last
    /// error; a move into `Failed` keeps it as the terminal diagnosis.
    pub fn advance_to(&mut self, stage: WorkflowStage) {
        self.stage = stage;
        if !stage.is_failed() {
            self.last_error = None;
        }
        self.updated_at = Utc::now();
    }
}

//! Shared configuration, payload builders and the wired test harness.

use std::sync::Arc;

use gangway::config::GangwayConfig;
use gangway::messaging::parse_inbound;
use gangway::models::WorkflowState;
use gangway::orchestration::{
    InvocationOutcome, OnboardingOrchestrator, StageExecutors, StatusReporter,
};
use gangway::routing::{PlacementRule, PlacementRules, PlacementTarget, RuleConditions};
use gangway::state_store::{InMemoryStateStore, WorkflowStateStore};

use super::fakes::{
    RecordingEscalation, RecordingScheduler, RecordingStatusSink, ScriptedDirectory,
    ScriptedLicense, ScriptedTracking,
};

pub const DEFAULT_OU: &str = "OU=Staff,DC=corp,DC=example";
pub const ENGINEERING_OU: &str = "OU=Engineering,DC=corp,DC=example";
pub const FINANCE_OU: &str = "OU=Finance,DC=corp,DC=example";

/// Rule set used across the scenario tests: engineering and finance have
/// dedicated placements, everything else lands in the flagged default
pub fn test_rules() -> PlacementRules {
    PlacementRules {
        rules: vec![
            PlacementRule {
                conditions: RuleConditions {
                    departments: Some(vec!["engineering".to_string()]),
                    locations: None,
                    keywords: None,
                },
                target: PlacementTarget {
                    domain: "corp.example".to_string(),
                    ou: ENGINEERING_OU.to_string(),
                    netbios_domain: None,
                },
            },
            PlacementRule {
                conditions: RuleConditions {
                    departments: Some(vec!["finance".to_string()]),
                    locations: Some(vec!["london".to_string()]),
                    keywords: None,
                },
                target: PlacementTarget {
                    domain: "corp.example".to_string(),
                    ou: FINANCE_OU.to_string(),
                    netbios_domain: None,
                },
            },
        ],
        default: PlacementTarget {
            domain: "corp.example".to_string(),
            ou: DEFAULT_OU.to_string(),
            netbios_domain: None,
        },
    }
}

/// Default configuration with test rules and backoffs shrunk so retry
/// scenarios finish in milliseconds
pub fn test_config() -> GangwayConfig {
    let mut config = GangwayConfig::default();
    config.placement = test_rules();
    config.retry.inline_backoff_ms = 1;
    config.retry.resume_backoff_secs = 1;
    config
}

pub fn trigger_json(ticket_key: &str, full_name: &str, department: &str) -> String {
    serde_json::json!({
        "ticketKey": ticket_key,
        "employeeData": { "fullName": full_name, "department": department }
    })
    .to_string()
}

pub fn trigger_json_full(ticket_key: &str, employee_data: serde_json::Value) -> String {
    serde_json::json!({
        "ticketKey": ticket_key,
        "employeeData": employee_data
    })
    .to_string()
}

/// Fully wired orchestrator over scripted fakes, with every collaborator
/// exposed for priming and assertions
pub struct TestHarness {
    pub orchestrator: OnboardingOrchestrator,
    pub store: Arc<InMemoryStateStore>,
    pub directory: Arc<ScriptedDirectory>,
    pub license: Arc<ScriptedLicense>,
    pub tracking: Arc<ScriptedTracking>,
    pub status: Arc<RecordingStatusSink>,
    pub escalation: Arc<RecordingEscalation>,
    pub scheduler: Arc<RecordingScheduler>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: GangwayConfig) -> Self {
        init_test_logging();

        let store = Arc::new(InMemoryStateStore::new());
        let directory = Arc::new(ScriptedDirectory::default());
        let license = Arc::new(ScriptedLicense::default());
        let tracking = Arc::new(ScriptedTracking::default());
        let status = Arc::new(RecordingStatusSink::default());
        let escalation = Arc::new(RecordingEscalation::default());
        let scheduler = Arc::new(RecordingScheduler::default());

        let executors = StageExecutors::new(
            directory.clone(),
            license.clone(),
            tracking.clone(),
            config.identity.clone(),
            config.tracking.clone(),
        );
        let reporter = StatusReporter::new(
            status.clone(),
            Some(escalation.clone()),
            config.reporting.clone(),
        );
        let orchestrator = OnboardingOrchestrator::new(
            config,
            store.clone(),
            executors,
            scheduler.clone(),
            reporter,
        );

        Self {
            orchestrator,
            store,
            directory,
            license,
            tracking,
            status,
            escalation,
            scheduler,
        }
    }

    /// Decode a raw payload and run it through the orchestrator
    pub async fn submit_raw(&self, raw: &str) -> InvocationOutcome {
        let event = parse_inbound(raw).expect("payload should decode");
        self.orchestrator
            .handle_event(event)
            .await
            .expect("invocation should not hit infrastructure errors")
    }

    /// Deliver the oldest scheduled wake-up as if its due time had passed
    pub async fn fire_next_resume(&self) -> InvocationOutcome {
        let (envelope, _due) = self
            .scheduler
            .next_scheduled()
            .expect("a resume should have been scheduled");
        self.orchestrator
            .handle_resume(envelope)
            .await
            .expect("invocation should not hit infrastructure errors")
    }

    pub async fn state_of(&self, ticket_key: &str) -> WorkflowState {
        self.store
            .load(ticket_key)
            .await
            .expect("store should load")
            .expect("workflow state should exist")
    }
}

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("gangway=debug")
        .with_test_writer()
        .try_init();
}

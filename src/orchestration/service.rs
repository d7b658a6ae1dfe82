//! # Onboarding Service
//!
//! Wires the orchestrator to an inbound event channel and processes events
//! one at a time. Ingestion surfaces hand payloads to an [`EventSubmitter`];
//! the in-process scheduler feeds its wake-ups into the same channel, so a
//! running service sees triggers and resumes interleaved in arrival order.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::GangwayConfig;
use crate::messaging::{parse_inbound, EnvelopeError, InboundEvent};
use crate::services::{
    DirectoryService, EscalationSink, LicenseService, StatusSink, TrackingService,
};
use crate::state_store::WorkflowStateStore;

use super::orchestrator::OnboardingOrchestrator;
use super::reporter::StatusReporter;
use super::scheduler::InProcessResumeScheduler;
use super::stages::StageExecutors;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Errors raised while feeding events into the service
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error("Onboarding service is not running")]
    ChannelClosed,
}

/// External collaborators the service needs wired in
pub struct ServiceDependencies {
    pub store: Arc<dyn WorkflowStateStore>,
    pub directory: Arc<dyn DirectoryService>,
    pub license: Arc<dyn LicenseService>,
    pub tracking: Arc<dyn TrackingService>,
    pub status: Arc<dyn StatusSink>,
    pub escalation: Option<Arc<dyn EscalationSink>>,
}

/// Cloneable sender half for ingestion surfaces
#[derive(Clone)]
pub struct EventSubmitter {
    events: mpsc::Sender<InboundEvent>,
}

impl EventSubmitter {
    /// Submit an already-decoded event
    pub async fn submit(&self, event: InboundEvent) -> Result<(), SubmitError> {
        self.events
            .send(event)
            .await
            .map_err(|_| SubmitError::ChannelClosed)
    }

    /// Decode a raw payload and submit it. Payloads that do not decode are
    /// rejected here, before anything touches workflow state.
    pub async fn submit_raw(&self, raw: &str) -> Result<(), SubmitError> {
        let event = parse_inbound(raw)?;
        debug!(
            ticket_key = %event.ticket_key(),
            kind = event.kind(),
            "Inbound payload accepted"
        );
        self.submit(event).await
    }
}

/// Channel-fed onboarding service.
///
/// [`run`](Self::run) processes events sequentially until every sender is
/// gone. The in-process scheduler keeps one sender for its wake-ups, so in
/// practice the loop lives as long as the process and stops with it.
pub struct OnboardingService {
    orchestrator: OnboardingOrchestrator,
    events: mpsc::Receiver<InboundEvent>,
}

impl OnboardingService {
    /// Build a fully wired service plus the submitter for feeding it
    pub fn build(config: GangwayConfig, deps: ServiceDependencies) -> (Self, EventSubmitter) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let scheduler = Arc::new(InProcessResumeScheduler::new(tx.clone()));
        let executors = StageExecutors::new(
            deps.directory,
            deps.license,
            deps.tracking,
            config.identity.clone(),
            config.tracking.clone(),
        );
        let reporter = StatusReporter::new(deps.status, deps.escalation, config.reporting.clone());
        let orchestrator =
            OnboardingOrchestrator::new(config, deps.store, executors, scheduler, reporter);

        (
            Self {
                orchestrator,
                events: rx,
            },
            EventSubmitter { events: tx },
        )
    }

    /// Process inbound events until the channel closes.
    ///
    /// Invocation errors are logged and dropped: the sources redeliver, and
    /// every handler tolerates redelivery.
    pub async fn run(mut self) {
        info!("Onboarding service started");

        while let Some(event) = self.events.recv().await {
            let invocation_id = Uuid::new_v4();
            let ticket_key = event.ticket_key().to_string();
            let kind = event.kind();

            debug!(
                invocation_id = %invocation_id,
                ticket_key = %ticket_key,
                kind = kind,
                "Processing inbound event"
            );

            match self.orchestrator.handle_event(event).await {
                Ok(outcome) => {
                    info!(
                        invocation_id = %invocation_id,
                        ticket_key = %ticket_key,
                        kind = kind,
                        outcome = ?outcome,
                        "Invocation finished"
                    );
                }
                Err(e) => {
                    error!(
                        invocation_id = %invocation_id,
                        ticket_key = %ticket_key,
                        kind = kind,
                        error = %e,
                        "Invocation failed, relying on redelivery"
                    );
                }
            }
        }

        info!("Inbound channel closed, onboarding service stopping");
    }
}

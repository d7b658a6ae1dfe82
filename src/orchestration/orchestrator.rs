//! # Onboarding Orchestrator
//!
//! Drives one workflow through its stages, one inbound event at a time. An
//! invocation loads the workflow record, does as much as it can, and persists
//! progress through the store's compare-and-set. Two invocations for the same
//! ticket can race; the version check decides the winner and the loser drops
//! its work without a trace.
//!
//! The workflow runs in two halves. The account half creates the directory
//! account and copies grants, then parks the workflow and schedules a wake-up
//! for after the directory sync window. The access half runs on that wake-up:
//! license assignment and the tracking account, then completion. Transient
//! failures retry inline in the first half and through re-scheduled wake-ups
//! in the second, both under the same attempt budget.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::config::GangwayConfig;
use crate::messaging::{InboundEvent, ResumeEnvelope, TriggerEnvelope};
use crate::models::{CanonicalIdentity, OnboardingRequest, WorkflowState};
use crate::state_machine::{next_stage, WorkflowEvent, WorkflowStage};
use crate::state_store::{StateStoreError, WorkflowStateStore};

use super::errors::{OrchestrationResult, StageError};
use super::reporter::StatusReporter;
use super::scheduler::{ResumeScheduler, ScheduleError};
use super::stages::StageExecutors;

/// How one inbound event invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationOutcome {
    /// Account half done, workflow parked until the sync wake-up
    Parked,
    /// Workflow reached `Completed`
    Completed,
    /// Transient failure, a retry wake-up has been scheduled
    RetryScheduled,
    /// Workflow reached `Failed`
    Failed,
    /// Duplicate or stale event, nothing was done
    Ignored,
    /// Unusable trigger, reported and dropped without creating state
    Rejected,
}

/// Event-driven workflow engine for employee onboarding
pub struct OnboardingOrchestrator {
    config: GangwayConfig,
    store: Arc<dyn WorkflowStateStore>,
    executors: StageExecutors,
    scheduler: Arc<dyn ResumeScheduler>,
    reporter: StatusReporter,
}

impl OnboardingOrchestrator {
    pub fn new(
        config: GangwayConfig,
        store: Arc<dyn WorkflowStateStore>,
        executors: StageExecutors,
        scheduler: Arc<dyn ResumeScheduler>,
        reporter: StatusReporter,
    ) -> Self {
        Self {
            config,
            store,
            executors,
            scheduler,
            reporter,
        }
    }

    /// Handle any inbound event
    pub async fn handle_event(&self, event: InboundEvent) -> OrchestrationResult<InvocationOutcome> {
        match event {
            InboundEvent::Trigger(envelope) => self.handle_trigger(envelope).await,
            InboundEvent::Resume(envelope) => self.handle_resume(envelope).await,
        }
    }

    /// Handle a fresh onboarding trigger.
    ///
    /// Duplicates are detected against the stored record: once the account
    /// exists or the workflow is finished, a repeat trigger is a no-op. A
    /// redelivery that catches the workflow mid-creation re-runs the account
    /// half from the stored snapshot, which the executors make safe.
    #[instrument(skip(self, envelope), fields(ticket_key = %envelope.ticket_key))]
    pub async fn handle_trigger(
        &self,
        envelope: TriggerEnvelope,
    ) -> OrchestrationResult<InvocationOutcome> {
        let ticket_key = envelope.ticket_key.clone();

        if let Some(existing) = self.store.load(&ticket_key).await? {
            if existing.stage.is_terminal() || existing.stage.account_exists() {
                info!(
                    stage = %existing.stage,
                    "Duplicate trigger for a workflow that already made progress, ignoring"
                );
                return Ok(InvocationOutcome::Ignored);
            }
            info!(
                stage = %existing.stage,
                "Trigger redelivered mid-creation, re-running from the stored snapshot"
            );
            return self.run_account_half(existing).await;
        }

        let request = match OnboardingRequest::from_parts(&ticket_key, envelope.employee_data) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Trigger rejected by validation");
                self.reporter
                    .report_error(
                        &ticket_key,
                        &format!(
                            "Onboarding request rejected: {e}. \
                             Correct the ticket fields and trigger again."
                        ),
                    )
                    .await;
                return Ok(InvocationOutcome::Rejected);
            }
        };

        let state = WorkflowState::new(request);
        match self.store.insert_new(&state).await {
            Ok(()) => {}
            Err(StateStoreError::AlreadyExists { .. }) => {
                info!("Another invocation created this workflow first, ignoring duplicate trigger");
                return Ok(InvocationOutcome::Ignored);
            }
            Err(e) => return Err(e.into()),
        }

        self.reporter
            .report(
                &ticket_key,
                &format!(
                    "Onboarding automation started for {} ({}).",
                    state.request.full_name, state.request.department
                ),
            )
            .await;

        self.run_account_half(state).await
    }

    /// Handle a scheduled wake-up.
    ///
    /// Only a workflow parked in `AccountPendingSync` moves forward here; a
    /// redelivery mid-assignment continues where it left off, and anything
    /// else is stale and gets dropped.
    #[instrument(
        skip(self, envelope),
        fields(ticket_key = %envelope.ticket_key, resume_attempt = envelope.resume_attempt)
    )]
    pub async fn handle_resume(
        &self,
        envelope: ResumeEnvelope,
    ) -> OrchestrationResult<InvocationOutcome> {
        let Some(mut state) = self.store.load(&envelope.ticket_key).await? else {
            warn!("Resume for a ticket with no workflow state, ignoring");
            return Ok(InvocationOutcome::Ignored);
        };

        match state.stage {
            WorkflowStage::Completed | WorkflowStage::Failed => {
                debug!(stage = %state.stage, "Resume for a finished workflow, ignoring");
                return Ok(InvocationOutcome::Ignored);
            }
            WorkflowStage::Received | WorkflowStage::AccountCreating => {
                warn!(
                    stage = %state.stage,
                    "Resume arrived before the account half finished, ignoring"
                );
                return Ok(InvocationOutcome::Ignored);
            }
            WorkflowStage::AccountPendingSync => {
                state.advance_to(next_stage(state.stage, &WorkflowEvent::Resume)?);
                state = match self.try_persist(&state).await? {
                    Some(stored) => stored,
                    None => return Ok(InvocationOutcome::Ignored),
                };
            }
            WorkflowStage::AccessAssigning => {
                debug!("Resume redelivered mid-assignment, continuing");
            }
        }

        self.run_access_half(state, envelope.resume_attempt).await
    }

    /// Directory account creation and grant copying, with inline retries
    async fn run_account_half(
        &self,
        mut state: WorkflowState,
    ) -> OrchestrationResult<InvocationOutcome> {
        let ticket_key = state.ticket_key.clone();
        let resolution = self.config.placement.resolve(&state.request);
        let identity = CanonicalIdentity::derive(
            &state.request,
            self.config.identity.email_format,
            &resolution.placement.domain,
        );
        let stage = WorkflowStage::AccountCreating;

        if state.stage == WorkflowStage::Received {
            state.advance_to(next_stage(state.stage, &WorkflowEvent::Start)?);
            state = match self.try_persist(&state).await? {
                Some(stored) => stored,
                None => return Ok(InvocationOutcome::Ignored),
            };
        }

        let (account, grants) = loop {
            // A counter already at the limit means the budget was spent by
            // earlier deliveries that died mid-attempt
            if self
                .config
                .retry
                .attempts_exhausted(state.attempts_for(stage))
            {
                return self
                    .fail_workflow(state, "account creation retry budget exhausted")
                    .await;
            }

            let attempt = state.record_attempt(stage);
            state = match self.try_persist(&state).await? {
                Some(stored) => stored,
                None => return Ok(InvocationOutcome::Ignored),
            };

            let result = self
                .run_stage(stage, async {
                    let account = self
                        .executors
                        .create_directory_account(&state.request, &identity, &resolution.placement)
                        .await?;
                    let grants = self
                        .executors
                        .copy_access_grants(&state.request, &identity, &resolution.placement)
                        .await?;
                    Ok((account, grants))
                })
                .await;

            match result {
                Ok(pair) => break pair,
                Err(e) if e.is_retryable() && !self.config.retry.attempts_exhausted(attempt) => {
                    let delay = self.config.retry.inline_backoff(attempt);
                    warn!(
                        ticket_key = %ticket_key,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Account creation attempt failed, retrying inline"
                    );
                    self.reporter
                        .report_error(
                            &ticket_key,
                            &format!(
                                "Attempt {} of {} failed: {}. Retrying.",
                                attempt, self.config.retry.max_attempts, e
                            ),
                        )
                        .await;
                    state.record_error(e.to_string());
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return self.fail_workflow(state, &e.to_string()).await,
            }
        };

        state.advance_to(next_stage(state.stage, &WorkflowEvent::AccountProvisioned)?);
        state = match self.try_persist(&state).await? {
            Some(stored) => stored,
            None => return Ok(InvocationOutcome::Ignored),
        };

        let mut body = format!(
            "Directory account ready: username '{}', email '{}', organizational unit '{}'.",
            identity.username, identity.email, resolution.placement.ou
        );
        if resolution.used_default {
            body.push_str(&format!(
                " No placement rule matched department '{}'; the default placement \
                 was used and should be verified.",
                state.request.department
            ));
        }
        if account.already_existed {
            body.push_str(" The account already existed and was reused.");
        }
        if let Some(detail) = &grants.detail {
            body.push_str(&format!(" Access grants: {detail}."));
        }
        self.reporter.report(&ticket_key, &body).await;

        let due = due_at(self.config.scheduling.sync_delay());
        let envelope =
            ResumeEnvelope::new(ticket_key.clone(), 1).with_user_email(identity.email.clone());
        if let Err(e) = self.schedule_with_retry(envelope, due).await {
            return self
                .fail_workflow(state, &format!("could not schedule the sync wake-up: {e}"))
                .await;
        }

        self.reporter
            .report(
                &ticket_key,
                &format!(
                    "Waiting for directory sync. Access assignment resumes after {} \
                     (in about {} minutes).",
                    due.format("%Y-%m-%d %H:%M:%S UTC"),
                    self.config.scheduling.sync_delay_secs / 60
                ),
            )
            .await;

        info!(
            ticket_key = %ticket_key,
            username = %identity.username,
            due_at = %due,
            "Workflow parked awaiting directory sync"
        );
        Ok(InvocationOutcome::Parked)
    }

    /// License assignment and tracking account, one attempt per delivery.
    /// Transient failures go back through the scheduler instead of looping
    /// inline, since the usual cause is replication lag that needs minutes.
    async fn run_access_half(
        &self,
        mut state: WorkflowState,
        resume_attempt: u32,
    ) -> OrchestrationResult<InvocationOutcome> {
        let ticket_key = state.ticket_key.clone();
        let resolution = self.config.placement.resolve(&state.request);
        let identity = CanonicalIdentity::derive(
            &state.request,
            self.config.identity.email_format,
            &resolution.placement.domain,
        );
        let stage = WorkflowStage::AccessAssigning;

        if self
            .config
            .retry
            .attempts_exhausted(state.attempts_for(stage))
        {
            return self
                .fail_workflow(state, "access assignment retry budget exhausted")
                .await;
        }

        let attempt = state.record_attempt(stage);
        state = match self.try_persist(&state).await? {
            Some(stored) => stored,
            None => return Ok(InvocationOutcome::Ignored),
        };

        let result = self
            .run_stage(stage, async {
                let license = self
                    .executors
                    .assign_license(&state.request, &identity)
                    .await?;
                let tracking = self
                    .executors
                    .create_tracking_account(&state.request, &identity)
                    .await?;
                Ok((license, tracking))
            })
            .await;

        let (license, tracking) = match result {
            Ok(pair) => pair,
            Err(e) => {
                return self
                    .handle_access_failure(state, e, attempt, resume_attempt, &identity)
                    .await;
            }
        };

        state.advance_to(next_stage(state.stage, &WorkflowEvent::AccessGranted)?);
        match self.try_persist(&state).await? {
            Some(_) => {}
            None => return Ok(InvocationOutcome::Ignored),
        }

        let mut body = format!("Onboarding completed for {}.", state.request.full_name);
        if license.already_existed {
            body.push_str(" The license was already in place.");
        } else if let Some(sku) = &license.external_id {
            body.push_str(&format!(" License '{sku}' assigned to {}.", identity.email));
        }
        if let Some(account_id) = &tracking.external_id {
            body.push_str(&format!(" Tracking account '{account_id}' created."));
        }
        self.reporter.report(&ticket_key, &body).await;

        info!(
            ticket_key = %ticket_key,
            email = %identity.email,
            attempts = attempt,
            "Workflow completed"
        );
        Ok(InvocationOutcome::Completed)
    }

    /// Route a failed access attempt: permanent or exhausted failures finish
    /// the workflow, transient ones get a re-scheduled wake-up
    async fn handle_access_failure(
        &self,
        mut state: WorkflowState,
        error: StageError,
        attempt: u32,
        resume_attempt: u32,
        identity: &CanonicalIdentity,
    ) -> OrchestrationResult<InvocationOutcome> {
        if !error.is_retryable() || self.config.retry.attempts_exhausted(attempt) {
            return self.fail_workflow(state, &error.to_string()).await;
        }

        state.record_error(error.to_string());
        state = match self.try_persist(&state).await? {
            Some(stored) => stored,
            None => return Ok(InvocationOutcome::Ignored),
        };

        let due = due_at(self.config.retry.resume_backoff(attempt));
        warn!(
            ticket_key = %state.ticket_key,
            attempt = attempt,
            due_at = %due,
            error = %error,
            "Access assignment attempt failed, scheduling a retry wake-up"
        );
        self.reporter
            .report_error(
                &state.ticket_key,
                &format!(
                    "Attempt {} of {} failed: {}. The next attempt is scheduled for {}.",
                    attempt,
                    self.config.retry.max_attempts,
                    error,
                    due.format("%Y-%m-%d %H:%M:%S UTC")
                ),
            )
            .await;

        let envelope = ResumeEnvelope::new(state.ticket_key.clone(), resume_attempt + 1)
            .with_user_email(identity.email.clone());
        if let Err(e) = self.schedule_with_retry(envelope, due).await {
            return self
                .fail_workflow(state, &format!("could not schedule the retry wake-up: {e}"))
                .await;
        }

        Ok(InvocationOutcome::RetryScheduled)
    }

    /// Move the workflow to `Failed`, report once and escalate
    async fn fail_workflow(
        &self,
        mut state: WorkflowState,
        reason: &str,
    ) -> OrchestrationResult<InvocationOutcome> {
        let failed_from = state.stage;
        warn!(
            ticket_key = %state.ticket_key,
            stage = %failed_from,
            reason = %reason,
            "Workflow failed"
        );

        state.record_error(reason);
        state.advance_to(next_stage(
            state.stage,
            &WorkflowEvent::fail_with_error(reason),
        )?);
        match self.try_persist(&state).await? {
            Some(_) => {}
            None => return Ok(InvocationOutcome::Ignored),
        }

        self.reporter
            .report_error(
                &state.ticket_key,
                &format!(
                    "Onboarding failed at the {failed_from} stage: {reason}. \
                     Manual intervention required."
                ),
            )
            .await;
        self.reporter
            .escalate(
                &state.ticket_key,
                &format!("Onboarding failed: {}", state.ticket_key),
                &format!(
                    "Workflow for {} ({}) failed at the {} stage after {} attempts: {}",
                    state.request.full_name,
                    state.ticket_key,
                    failed_from,
                    state.attempts_for(failed_from),
                    reason
                ),
            )
            .await;

        Ok(InvocationOutcome::Failed)
    }

    /// CAS write. `Ok(None)` means another invocation won the version race
    /// and this one must stop without further writes or reports.
    async fn try_persist(&self, state: &WorkflowState) -> OrchestrationResult<Option<WorkflowState>> {
        match self.store.compare_and_update(state).await {
            Ok(stored) => Ok(Some(stored)),
            Err(e) if e.is_conflict() => {
                info!(
                    ticket_key = %state.ticket_key,
                    error = %e,
                    "Lost the version race, dropping this invocation's work"
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Run a stage future under the configured wall-clock budget
    async fn run_stage<T, F>(&self, stage: WorkflowStage, fut: F) -> Result<T, StageError>
    where
        F: std::future::Future<Output = Result<T, StageError>>,
    {
        let budget = self.config.execution.stage_timeout();
        match tokio::time::timeout(budget, fut).await {
            Ok(result) => result,
            Err(_) => Err(StageError::timeout(stage.to_string(), budget.as_secs())),
        }
    }

    /// Hand a wake-up to the scheduler, retrying a couple of times before
    /// giving up. A workflow that cannot get its wake-up scheduled is failed
    /// rather than left parked forever.
    async fn schedule_with_retry(
        &self,
        envelope: ResumeEnvelope,
        not_before: DateTime<Utc>,
    ) -> Result<(), ScheduleError> {
        let budget = self.config.scheduling.schedule_retry_attempts;
        let mut attempt = 0u32;
        loop {
            match self
                .scheduler
                .schedule_resume(envelope.clone(), not_before)
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) if attempt < budget => {
                    attempt += 1;
                    warn!(
                        ticket_key = %envelope.ticket_key,
                        attempt = attempt,
                        error = %e,
                        "Resume scheduling failed, retrying"
                    );
                    tokio::time::sleep(self.config.retry.inline_backoff(attempt)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Wall-clock due time for a delay, saturating instead of overflowing on
/// degenerate configuration values
fn due_at(delay: std::time::Duration) -> DateTime<Utc> {
    let now = Utc::now();
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(now)
}

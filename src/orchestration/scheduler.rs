//! # Resume Scheduling
//!
//! A workflow parks after account creation and needs a wake-up once the
//! directory sync window has passed, and again for each re-scheduled retry.
//! [`ResumeScheduler`] is the seam for that; the in-process implementation
//! rides on the tokio timer and feeds the wake-up straight back into the
//! orchestrator's inbound channel. Deployments with a durable delay queue
//! implement the same trait against it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::messaging::{InboundEvent, ResumeEnvelope};

/// Errors raised while scheduling a deferred resume
#[derive(Error, Debug, Clone)]
pub enum ScheduleError {
    /// The wake-up could not be handed to the delivery mechanism
    #[error("Resume delivery unavailable: {message}")]
    Delivery { message: String },
}

impl ScheduleError {
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
        }
    }
}

/// Schedules a resume envelope for delivery at or after `not_before`.
///
/// Delivery timing is at-least-delay: envelopes must never arrive early, and
/// arriving late only stretches the park, never breaks it.
#[async_trait]
pub trait ResumeScheduler: Send + Sync {
    async fn schedule_resume(
        &self,
        envelope: ResumeEnvelope,
        not_before: DateTime<Utc>,
    ) -> Result<(), ScheduleError>;
}

/// A wake-up that has been accepted but not yet delivered
#[derive(Debug, Clone, PartialEq)]
pub struct PendingResume {
    pub ticket_key: String,
    pub due_at: DateTime<Utc>,
}

/// Timer-backed scheduler delivering resumes into an in-process channel.
///
/// Wake-ups do not survive a process restart; the deployment compensates by
/// re-triggering stalled tickets, which the handlers treat as redelivery.
pub struct InProcessResumeScheduler {
    events: mpsc::Sender<InboundEvent>,
    pending: Arc<Mutex<Vec<PendingResume>>>,
}

impl InProcessResumeScheduler {
    pub fn new(events: mpsc::Sender<InboundEvent>) -> Self {
        Self {
            events,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Snapshot of accepted wake-ups that have not fired yet
    pub fn pending_resumes(&self) -> Vec<PendingResume> {
        self.pending.lock().clone()
    }
}

#[async_trait]
impl ResumeScheduler for InProcessResumeScheduler {
    async fn schedule_resume(
        &self,
        envelope: ResumeEnvelope,
        not_before: DateTime<Utc>,
    ) -> Result<(), ScheduleError> {
        if self.events.is_closed() {
            return Err(ScheduleError::delivery(
                "inbound event channel is closed, no receiver for wake-ups",
            ));
        }

        let delay = (not_before - Utc::now())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);

        let entry = PendingResume {
            ticket_key: envelope.ticket_key.clone(),
            due_at: not_before,
        };
        self.pending.lock().push(entry);

        debug!(
            ticket_key = %envelope.ticket_key,
            resume_attempt = envelope.resume_attempt,
            due_at = %not_before,
            delay_secs = delay.as_secs(),
            "Resume scheduled"
        );

        let events = self.events.clone();
        let pending = Arc::clone(&self.pending);
        let envelope = envelope.with_scheduled_at(not_before);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            {
                let mut pending = pending.lock();
                if let Some(pos) = pending
                    .iter()
                    .position(|p| p.ticket_key == envelope.ticket_key && p.due_at == not_before)
                {
                    pending.remove(pos);
                }
            }

            let ticket_key = envelope.ticket_key.clone();
            if let Err(e) = events.send(InboundEvent::Resume(envelope)).await {
                // Receiver went away during the delay, nothing left to wake
                warn!(
                    ticket_key = %ticket_key,
                    error = %e,
                    "Resume fired but the inbound channel was gone"
                );
            }
        });

        Ok(())
    }
}

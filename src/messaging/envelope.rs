use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::EmployeeData;

/// Errors raised while decoding inbound message payloads
#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("Malformed envelope: {message}")]
    Malformed { message: String },

    #[error("Envelope is missing a ticket key")]
    MissingTicketKey,
}

impl EnvelopeError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for EnvelopeError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(err.to_string())
    }
}

/// Fresh onboarding trigger as published by the ticketing automation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerEnvelope {
    pub ticket_key: String,
    /// Absent employee data still parses; field validation happens when the
    /// request model is built, so the failure can be reported to the ticket.
    #[serde(default)]
    pub employee_data: EmployeeData,
}

/// Scheduled wake-up for the post-sync half of a workflow.
///
/// Deliberately thin: the workflow record holds the request snapshot, so a
/// resume only needs the correlation identifier plus bookkeeping fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeEnvelope {
    pub ticket_key: String,
    /// Which resume delivery this is, starting at 1 for the initial wake-up
    pub resume_attempt: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl ResumeEnvelope {
    pub fn new(ticket_key: impl Into<String>, resume_attempt: u32) -> Self {
        Self {
            ticket_key: ticket_key.into(),
            resume_attempt,
            user_email: None,
            scheduled_at: None,
        }
    }

    pub fn with_user_email(mut self, user_email: impl Into<String>) -> Self {
        self.user_email = Some(user_email.into());
        self
    }

    pub fn with_scheduled_at(mut self, scheduled_at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(scheduled_at);
        self
    }
}

/// Any message the orchestrator can receive
#[derive(Debug, Clone)]
pub enum InboundEvent {
    Trigger(TriggerEnvelope),
    Resume(ResumeEnvelope),
}

impl InboundEvent {
    /// Correlation identifier, whichever shape arrived
    pub fn ticket_key(&self) -> &str {
        match self {
            Self::Trigger(envelope) => &envelope.ticket_key,
            Self::Resume(envelope) => &envelope.ticket_key,
        }
    }

    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Trigger(_) => "trigger",
            Self::Resume(_) => "resume",
        }
    }
}

/// Decode a raw inbound payload into an event.
///
/// Triggers may arrive wrapped by the ticketing automation as
/// `{"automationData": {"default": "<json string>"}}`; the nested string is
/// unwrapped before decoding. A payload carrying `resumeAttempt` is a resume,
/// anything else is treated as a trigger.
pub fn parse_inbound(raw: &str) -> Result<InboundEvent, EnvelopeError> {
    let mut value: Value = serde_json::from_str(raw)?;

    if let Some(inner) = value
        .get("automationData")
        .and_then(|data| data.get("default"))
        .and_then(Value::as_str)
    {
        value = serde_json::from_str(inner)?;
    }

    if value.get("resumeAttempt").is_some() {
        let envelope: ResumeEnvelope = serde_json::from_value(value)?;
        if envelope.ticket_key.trim().is_empty() {
            return Err(EnvelopeError::MissingTicketKey);
        }
        return Ok(InboundEvent::Resume(envelope));
    }

    let envelope: TriggerEnvelope = serde_json::from_value(value)?;
    if envelope.ticket_key.trim().is_empty() {
        return Err(EnvelopeError::MissingTicketKey);
    }
    Ok(InboundEvent::Trigger(envelope))
}

//! # Status Reporting
//!
//! Progress notes back to the originating ticket plus operator escalation on
//! terminal failure. Everything here is best-effort: a sink outage is logged
//! and swallowed so reporting can never stall or fail a workflow.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ReportingConfig;
use crate::services::{EscalationSink, StatusSink};

/// Posts workflow progress to the ticket and escalates terminal failures
pub struct StatusReporter {
    sink: Arc<dyn StatusSink>,
    escalation: Option<Arc<dyn EscalationSink>>,
    config: ReportingConfig,
}

impl StatusReporter {
    pub fn new(
        sink: Arc<dyn StatusSink>,
        escalation: Option<Arc<dyn EscalationSink>>,
        config: ReportingConfig,
    ) -> Self {
        Self {
            sink,
            escalation,
            config,
        }
    }

    /// Smoke-test tickets are recognized by key prefix and produce no
    /// reporting traffic at all
    fn should_skip(&self, ticket_key: &str) -> bool {
        self.config
            .skip_ticket_prefixes
            .iter()
            .any(|prefix| ticket_key.starts_with(prefix.as_str()))
    }

    /// Post a progress note to the ticket
    pub async fn report(&self, ticket_key: &str, body: &str) {
        self.post(ticket_key, body, false).await;
    }

    /// Post a failure note to the ticket
    pub async fn report_error(&self, ticket_key: &str, body: &str) {
        self.post(ticket_key, body, true).await;
    }

    async fn post(&self, ticket_key: &str, body: &str, is_error: bool) {
        if self.should_skip(ticket_key) {
            debug!(
                ticket_key = %ticket_key,
                "Ticket key matches a skip prefix, suppressing status report"
            );
            return;
        }

        if let Err(e) = self.sink.post_update(ticket_key, body, is_error).await {
            warn!(
                ticket_key = %ticket_key,
                is_error = is_error,
                error = %e,
                "Status report could not be delivered"
            );
        }
    }

    /// Notify operators about a terminal failure. Skipped for smoke-test
    /// tickets and when escalation is disabled in configuration.
    pub async fn escalate(&self, ticket_key: &str, subject: &str, body: &str) {
        if self.should_skip(ticket_key) || !self.config.escalation_enabled {
            debug!(
                ticket_key = %ticket_key,
                "Escalation suppressed"
            );
            return;
        }

        let Some(escalation) = self.escalation.as_ref() else {
            debug!(
                ticket_key = %ticket_key,
                "No escalation sink configured"
            );
            return;
        };

        if let Err(e) = escalation.notify(subject, body).await {
            warn!(
                ticket_key = %ticket_key,
                error = %e,
                "Escalation could not be delivered"
            );
        }
    }
}

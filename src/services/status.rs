//! Progress reporting seams.
//!
//! Both sinks are best-effort by contract: the reporter logs delivery
//! failures and moves on, so nothing here may be load-bearing for workflow
//! correctness.

use async_trait::async_trait;

use super::errors::ServiceResult;

/// Appends progress notes to the originating ticket, keyed by ticket key
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn post_update(&self, ticket_key: &str, body: &str, is_error: bool) -> ServiceResult<()>;
}

/// Operator escalation channel for terminal failures
#[async_trait]
pub trait EscalationSink: Send + Sync {
    async fn notify(&self, subject: &str, body: &str) -> ServiceResult<()>;
}

//! # Gangway Configuration System
//!
//! Typed configuration for the onboarding orchestrator. Values come from an
//! optional TOML file layered with `GANGWAY_`-prefixed environment variables
//! (nested keys use a double underscore: `GANGWAY_RETRY__MAX_ATTEMPTS`).
//! Every section carries serde defaults so a partial file is enough, and
//! validation runs once at load time so bad values fail fast instead of
//! surfacing mid-workflow.
//!
//! Configuration is constructed once per process and passed to components
//! explicitly. There are no ambient singletons; tests build [`GangwayConfig`]
//! by hand.

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::EmailFormat;
use crate::routing::PlacementRules;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GangwayConfig {
    /// Canonical identity derivation settings
    pub identity: IdentityConfig,

    /// Deferred re-entry timing
    pub scheduling: SchedulingConfig,

    /// Retry limits and backoff shape
    pub retry: RetryPolicy,

    /// Stage execution budget
    pub execution: ExecutionConfig,

    /// Status reporting behavior
    pub reporting: ReportingConfig,

    /// Project-tracking stage feature flag
    pub tracking: TrackingConfig,

    /// Identifiers of credential bundles in secret storage
    pub secrets: SecretsConfig,

    /// Placement rule set for the routing engine
    pub placement: PlacementRules,
}

/// Canonical identity derivation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub email_format: EmailFormat,
    /// Usage location set on the account before license assignment
    pub usage_location: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            email_format: EmailFormat::default(),
            usage_location: "GB".to_string(),
        }
    }
}

/// Deferred re-entry timing
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Delay between account creation and the first resume wake-up. Sized to
    /// outlast a directory sync cycle.
    pub sync_delay_secs: u64,
    /// How many times a failed schedule call is retried inline before the
    /// workflow is failed rather than left stalled
    pub schedule_retry_attempts: u32,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            sync_delay_secs: 900,
            schedule_retry_attempts: 2,
        }
    }
}

impl SchedulingConfig {
    pub fn sync_delay(&self) -> Duration {
        Duration::from_secs(self.sync_delay_secs)
    }
}

/// Retry limits and backoff shape, read-only after load.
///
/// Two backoff spaces exist on purpose: inline retries happen within one
/// invocation and stay short, while resume retries go back through the
/// scheduler and are measured in minutes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum attempts per stage, counting the first one
    pub max_attempts: u32,
    /// Base delay for inline retries within an invocation
    pub inline_backoff_ms: u64,
    /// Base delay for re-scheduled resume retries
    pub resume_backoff_secs: u64,
    /// Exponential growth factor applied per prior attempt
    pub backoff_multiplier: f64,
    /// Upper bound for any computed backoff
    pub max_backoff_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            inline_backoff_ms: 500,
            resume_backoff_secs: 300,
            backoff_multiplier: 2.0,
            max_backoff_secs: 3600,
        }
    }
}

impl RetryPolicy {
    /// Delay before inline retry number `attempt` (1-based: the delay after
    /// the first failed attempt is the base)
    pub fn inline_backoff(&self, attempt: u32) -> Duration {
        self.scaled(Duration::from_millis(self.inline_backoff_ms), attempt)
    }

    /// Delay before a re-scheduled resume retry
    pub fn resume_backoff(&self, attempt: u32) -> Duration {
        self.scaled(Duration::from_secs(self.resume_backoff_secs), attempt)
    }

    /// Whether a stage that has made `attempts` attempts is out of budget
    pub fn attempts_exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }

    fn scaled(&self, base: Duration, attempt: u32) -> Duration {
        // Exponent is clamped so a corrupt counter cannot overflow the math
        let exponent = attempt.saturating_sub(1).min(16);
        let factor = self.backoff_multiplier.powi(exponent as i32);
        let scaled = base.as_secs_f64() * factor;
        let capped = scaled.min(self.max_backoff_secs as f64);
        Duration::from_secs_f64(capped)
    }
}

/// Stage execution budget
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Wall-clock budget for one stage attempt; overruns count as transient
    pub stage_timeout_secs: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            stage_timeout_secs: 300,
        }
    }
}

impl ExecutionConfig {
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }
}

/// Status reporting behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportingConfig {
    /// Ticket-key prefixes that suppress reporting entirely, used by smoke
    /// tests against production configuration
    pub skip_ticket_prefixes: Vec<String>,
    /// Whether terminal failures also go to the operator escalation sink
    pub escalation_enabled: bool,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            skip_ticket_prefixes: vec!["TEST-".to_string()],
            escalation_enabled: true,
        }
    }
}

/// Project-tracking stage feature flag
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// When false the tracking stage is skipped and the workflow still
    /// completes
    pub enabled: bool,
    /// Product keys granted to new tracking accounts
    pub products: Vec<String>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            products: vec!["jira-software".to_string()],
        }
    }
}

/// Identifiers of credential bundles in secret storage. Only the identifiers
/// live here; fetching and holding the material is the adapters' concern.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SecretsConfig {
    pub directory_credentials: Option<String>,
    pub license_credentials: Option<String>,
    pub tracking_credentials: Option<String>,
    pub status_credentials: Option<String>,
    /// Secret holding the placement rule JSON, overriding the file section
    pub placement_rules: Option<String>,
}

impl GangwayConfig {
    /// Check cross-field constraints that serde defaults cannot express
    pub fn validate(&self) -> ConfigResult<()> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "retry.max_attempts",
                "must be at least 1",
            ));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(ConfigurationError::invalid_value(
                "retry.backoff_multiplier",
                "must be at least 1.0",
            ));
        }
        if self.scheduling.sync_delay_secs == 0 {
            return Err(ConfigurationError::invalid_value(
                "scheduling.sync_delay_secs",
                "must be at least 1",
            ));
        }
        if self.execution.stage_timeout_secs == 0 {
            return Err(ConfigurationError::invalid_value(
                "execution.stage_timeout_secs",
                "must be at least 1",
            ));
        }
        self.placement.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = GangwayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.scheduling.sync_delay_secs, 900);
        assert_eq!(config.retry.resume_backoff_secs, 300);
        assert!(!config.tracking.enabled);
        assert_eq!(config.reporting.skip_ticket_prefixes, vec!["TEST-"]);
    }

    #[test]
    fn test_backoff_grows_exponentially_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.inline_backoff(1), Duration::from_millis(500));
        assert_eq!(policy.inline_backoff(2), Duration::from_millis(1000));
        assert_eq!(policy.inline_backoff(3), Duration::from_millis(2000));

        assert_eq!(policy.resume_backoff(1), Duration::from_secs(300));
        assert_eq!(policy.resume_backoff(2), Duration::from_secs(600));

        // Deep attempt counts hit the cap instead of overflowing
        assert_eq!(
            policy.resume_backoff(30),
            Duration::from_secs(policy.max_backoff_secs)
        );
    }

    #[test]
    fn test_exhaustion_counts_the_first_attempt() {
        let policy = RetryPolicy::default();
        assert!(!policy.attempts_exhausted(2));
        assert!(policy.attempts_exhausted(3));
        assert!(policy.attempts_exhausted(4));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = GangwayConfig::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = GangwayConfig::default();
        config.retry.backoff_multiplier = 0.5;
        assert!(config.validate().is_err());

        let mut config = GangwayConfig::default();
        config.placement.default.domain = String::new();
        assert!(config.validate().is_err());
    }
}

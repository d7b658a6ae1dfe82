//! Directory service seam.
//!
//! Everything the workflow needs from the corporate directory: account
//! creation in a resolved placement, template-user lookup, group-membership
//! copying, and a best-effort sync kick. Transport (how commands reach a
//! domain controller) is the implementor's business and stays out of this
//! crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{CanonicalIdentity, OnboardingRequest};
use crate::routing::Placement;

use super::errors::ServiceResult;

/// Profile for a directory account to be created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccountSpec {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub department: String,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub manager: Option<String>,
    pub start_date: Option<String>,
    pub placement: Placement,
}

impl NewAccountSpec {
    /// Assemble the account profile from the validated request, the derived
    /// identity and the resolved placement
    pub fn from_request(
        request: &OnboardingRequest,
        identity: &CanonicalIdentity,
        placement: &Placement,
    ) -> Self {
        Self {
            username: identity.username.clone(),
            email: identity.email.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            display_name: request.full_name.clone(),
            department: request.department.clone(),
            job_title: request.job_title.clone(),
            company: request.company.clone(),
            manager: request.manager.clone(),
            start_date: request.start_date.clone(),
            placement: placement.clone(),
        }
    }
}

/// An existing directory user, as found by lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUser {
    pub username: String,
    pub display_name: Option<String>,
    pub distinguished_name: Option<String>,
}

/// What happened while copying group memberships from a template user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantCopySummary {
    pub copied: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

impl GrantCopySummary {
    pub fn total_attempted(&self) -> usize {
        self.copied.len() + self.skipped.len() + self.failed.len()
    }
}

/// Corporate directory operations used by the first half of the workflow
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Check whether an account with this username already exists in the
    /// placement's domain
    async fn account_exists(&self, username: &str, placement: &Placement) -> ServiceResult<bool>;

    /// Create the account. Returns the external identifier (distinguished
    /// name or equivalent). Implementations may surface a race as
    /// `AlreadyExists`; callers absorb that as success.
    async fn create_account(&self, spec: &NewAccountSpec) -> ServiceResult<String>;

    /// Find a user by username, email or display name. `Ok(None)` means the
    /// lookup worked and nobody matched.
    async fn find_user(
        &self,
        identifier: &str,
        placement: &Placement,
    ) -> ServiceResult<Option<DirectoryUser>>;

    /// Copy security-group memberships from a template user onto the new
    /// account. Groups that cannot be copied are reported, not fatal.
    async fn copy_group_memberships(
        &self,
        from: &DirectoryUser,
        to_username: &str,
        placement: &Placement,
    ) -> ServiceResult<GrantCopySummary>;

    /// Ask the directory to start a sync cycle now instead of waiting for
    /// the scheduled one. Best-effort: failures are logged by callers and
    /// never fail the stage.
    async fn trigger_sync(&self, placement: &Placement) -> ServiceResult<()>;
}

//! License and groupware service seam, the post-sync half of provisioning.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::errors::ServiceResult;

/// Outcome of a license assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseAssignment {
    /// Which product SKU ended up on the account
    pub sku: String,
    /// True when the account already held the license
    pub already_assigned: bool,
}

/// Outcome of replicating cloud group memberships from a template user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupReplication {
    pub added: Vec<String>,
    pub skipped: Vec<String>,
}

/// License/groupware directory operations.
///
/// The account only appears here after the corporate directory has synced
/// outward, which is why the workflow parks between its two halves.
#[async_trait]
pub trait LicenseService: Send + Sync {
    /// Has the directory account replicated into this directory yet
    async fn user_synced(&self, email: &str) -> ServiceResult<bool>;

    /// Usage location must be set before any license can be assigned
    async fn set_usage_location(&self, email: &str, location: &str) -> ServiceResult<()>;

    /// Assign the configured license to the account
    async fn assign_license(&self, email: &str) -> ServiceResult<LicenseAssignment>;

    /// Mirror cloud group memberships from a template user. Groups the
    /// caller lacks rights to are skipped, not fatal.
    async fn replicate_groups(
        &self,
        from_email: &str,
        to_email: &str,
    ) -> ServiceResult<GroupReplication>;
}

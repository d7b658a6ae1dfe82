//! Project-tracking service seam.
//!
//! The whole stage behind this trait is feature-flagged; when tracking is
//! disabled in configuration the workflow never touches it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::errors::ServiceResult;

/// Profile for a tracking-system account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingProfile {
    pub email: String,
    pub display_name: String,
    /// Product keys the new account gets access to
    pub products: Vec<String>,
}

/// Project-tracking account operations
#[async_trait]
pub trait TrackingService: Send + Sync {
    /// Check whether an account already exists for this email
    async fn user_exists(&self, email: &str) -> ServiceResult<bool>;

    /// Create the account with product access. Returns the external account
    /// identifier. A race may surface as `AlreadyExists`; callers absorb it.
    async fn create_user(&self, profile: &TrackingProfile) -> ServiceResult<String>;
}

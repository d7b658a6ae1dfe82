//! # Stage Executors
//!
//! The four provisioning stages, each written so a repeat execution of a
//! stage that already ran converges on the same result. Every executor
//! checks for the resource before creating it and absorbs already-exists
//! conflicts from the service as success, which is what makes redelivered
//! and retried invocations safe.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{IdentityConfig, TrackingConfig};
use crate::models::{CanonicalIdentity, OnboardingRequest};
use crate::routing::Placement;
use crate::services::{
    DirectoryService, LicenseService, NewAccountSpec, TrackingProfile, TrackingService,
};

use super::errors::StageError;

/// Stage names as they appear in errors, reports and logs
pub mod stage_names {
    pub const CREATE_DIRECTORY_ACCOUNT: &str = "create_directory_account";
    pub const COPY_ACCESS_GRANTS: &str = "copy_access_grants";
    pub const ASSIGN_LICENSE: &str = "assign_license";
    pub const CREATE_TRACKING_ACCOUNT: &str = "create_tracking_account";
}

/// What one successful stage execution produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOutcome {
    /// External identifier of the created resource, when the service hands
    /// one back
    pub external_id: Option<String>,
    /// True when the resource was already there and nothing was created
    pub already_existed: bool,
    /// Human-readable note carried into the status report
    pub detail: Option<String>,
}

impl StageOutcome {
    fn created(external_id: impl Into<String>) -> Self {
        Self {
            external_id: Some(external_id.into()),
            already_existed: false,
            detail: None,
        }
    }

    fn existing() -> Self {
        Self {
            external_id: None,
            already_existed: true,
            detail: None,
        }
    }

    fn skipped(detail: impl Into<String>) -> Self {
        Self {
            external_id: None,
            already_existed: false,
            detail: Some(detail.into()),
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Executes individual provisioning stages against the external services.
///
/// Holds no workflow state; the orchestrator decides which stage runs when
/// and what happens to the outcome.
pub struct StageExecutors {
    directory: Arc<dyn DirectoryService>,
    license: Arc<dyn LicenseService>,
    tracking: Arc<dyn TrackingService>,
    identity_config: IdentityConfig,
    tracking_config: TrackingConfig,
}

impl StageExecutors {
    pub fn new(
        directory: Arc<dyn DirectoryService>,
        license: Arc<dyn LicenseService>,
        tracking: Arc<dyn TrackingService>,
        identity_config: IdentityConfig,
        tracking_config: TrackingConfig,
    ) -> Self {
        Self {
            directory,
            license,
            tracking,
            identity_config,
            tracking_config,
        }
    }

    /// Create the directory account in its resolved placement.
    ///
    /// Existence is checked first so a rerun after a crash between create and
    /// state persist lands on the existing account. A fresh create also kicks
    /// off a directory sync; that kick is best-effort and never fails the
    /// stage.
    pub async fn create_directory_account(
        &self,
        request: &OnboardingRequest,
        identity: &CanonicalIdentity,
        placement: &Placement,
    ) -> Result<StageOutcome, StageError> {
        const STAGE: &str = stage_names::CREATE_DIRECTORY_ACCOUNT;

        let exists = self
            .directory
            .account_exists(&identity.username, placement)
            .await
            .map_err(|e| StageError::from_service(STAGE, e))?;

        if exists {
            info!(
                ticket_key = %request.ticket_key,
                username = %identity.username,
                "Directory account already exists, nothing to create"
            );
            return Ok(StageOutcome::existing());
        }

        let spec = NewAccountSpec::from_request(request, identity, placement);
        let outcome = match self.directory.create_account(&spec).await {
            Ok(external_id) => {
                info!(
                    ticket_key = %request.ticket_key,
                    username = %identity.username,
                    domain = %placement.domain,
                    ou = %placement.ou,
                    "Directory account created"
                );
                StageOutcome::created(external_id)
            }
            Err(e) if e.is_already_exists() => {
                // Lost a race against a concurrent invocation; same end state
                info!(
                    ticket_key = %request.ticket_key,
                    username = %identity.username,
                    "Directory account appeared concurrently, treating as created"
                );
                StageOutcome::existing()
            }
            Err(e) => return Err(StageError::from_service(STAGE, e)),
        };

        if !outcome.already_existed {
            if let Err(e) = self.directory.trigger_sync(placement).await {
                warn!(
                    ticket_key = %request.ticket_key,
                    error = %e,
                    "Directory sync kick failed, falling back to the scheduled cycle"
                );
            }
        }

        Ok(outcome)
    }

    /// Copy security-group memberships from the template user, when the
    /// request names one.
    ///
    /// A missing template user is a data problem in the request, not an
    /// infrastructure failure: the stage succeeds with a note so the account
    /// is not blocked on it.
    pub async fn copy_access_grants(
        &self,
        request: &OnboardingRequest,
        identity: &CanonicalIdentity,
        placement: &Placement,
    ) -> Result<StageOutcome, StageError> {
        const STAGE: &str = stage_names::COPY_ACCESS_GRANTS;

        let template = match request.copy_access_from.as_deref() {
            Some(t) if !t.trim().is_empty() => t.trim(),
            _ => {
                debug!(
                    ticket_key = %request.ticket_key,
                    "No template user on the request, skipping access copy"
                );
                return Ok(StageOutcome::skipped("no template user requested"));
            }
        };

        let template_user = self
            .directory
            .find_user(template, placement)
            .await
            .map_err(|e| StageError::from_service(STAGE, e))?;

        let Some(template_user) = template_user else {
            warn!(
                ticket_key = %request.ticket_key,
                template = %template,
                "Template user not found in directory, continuing without copied grants"
            );
            return Ok(StageOutcome::skipped(format!(
                "template user '{template}' not found, no grants copied"
            )));
        };

        let summary = self
            .directory
            .copy_group_memberships(&template_user, &identity.username, placement)
            .await
            .map_err(|e| StageError::from_service(STAGE, e))?;

        info!(
            ticket_key = %request.ticket_key,
            template = %template_user.username,
            copied = summary.copied.len(),
            skipped = summary.skipped.len(),
            failed = summary.failed.len(),
            "Group memberships copied from template user"
        );

        Ok(StageOutcome::default().with_detail(format!(
            "copied {} of {} groups from '{}'",
            summary.copied.len(),
            summary.total_attempted(),
            template_user.username
        )))
    }

    /// Assign the product license once the account has replicated into the
    /// license directory.
    ///
    /// An account that has not synced yet is the expected transient here; it
    /// routes back through the scheduler rather than failing inline. Usage
    /// location goes on first since assignment rejects accounts without one.
    pub async fn assign_license(
        &self,
        request: &OnboardingRequest,
        identity: &CanonicalIdentity,
    ) -> Result<StageOutcome, StageError> {
        const STAGE: &str = stage_names::ASSIGN_LICENSE;

        let synced = self
            .license
            .user_synced(&identity.email)
            .await
            .map_err(|e| StageError::from_service(STAGE, e))?;

        if !synced {
            return Err(StageError::transient(
                STAGE,
                format!(
                    "account '{}' not yet visible in the license directory",
                    identity.email
                ),
            ));
        }

        self.license
            .set_usage_location(&identity.email, &self.identity_config.usage_location)
            .await
            .map_err(|e| StageError::from_service(STAGE, e))?;

        let outcome = match self.license.assign_license(&identity.email).await {
            Ok(assignment) => {
                info!(
                    ticket_key = %request.ticket_key,
                    email = %identity.email,
                    sku = %assignment.sku,
                    already_assigned = assignment.already_assigned,
                    "License in place"
                );
                StageOutcome {
                    external_id: Some(assignment.sku),
                    already_existed: assignment.already_assigned,
                    detail: None,
                }
            }
            Err(e) if e.is_already_exists() => {
                info!(
                    ticket_key = %request.ticket_key,
                    email = %identity.email,
                    "License already assigned"
                );
                StageOutcome::existing()
            }
            Err(e) => return Err(StageError::from_service(STAGE, e)),
        };

        if let Some(template) = request.copy_access_from.as_deref() {
            let template = template.trim();
            if !template.is_empty() {
                match self
                    .license
                    .replicate_groups(template, &identity.email)
                    .await
                {
                    Ok(replication) => {
                        debug!(
                            ticket_key = %request.ticket_key,
                            added = replication.added.len(),
                            skipped = replication.skipped.len(),
                            "Cloud group memberships replicated"
                        );
                    }
                    Err(e) => {
                        warn!(
                            ticket_key = %request.ticket_key,
                            template = %template,
                            error = %e,
                            "Cloud group replication failed, license stage continues without it"
                        );
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Create the project-tracking account, when the stage is enabled.
    pub async fn create_tracking_account(
        &self,
        request: &OnboardingRequest,
        identity: &CanonicalIdentity,
    ) -> Result<StageOutcome, StageError> {
        const STAGE: &str = stage_names::CREATE_TRACKING_ACCOUNT;

        if !self.tracking_config.enabled {
            debug!(
                ticket_key = %request.ticket_key,
                "Tracking stage disabled, skipping"
            );
            return Ok(StageOutcome::skipped("tracking account creation disabled"));
        }

        let exists = self
            .tracking
            .user_exists(&identity.email)
            .await
            .map_err(|e| StageError::from_service(STAGE, e))?;

        if exists {
            info!(
                ticket_key = %request.ticket_key,
                email = %identity.email,
                "Tracking account already exists, nothing to create"
            );
            return Ok(StageOutcome::existing());
        }

        let profile = TrackingProfile {
            email: identity.email.clone(),
            display_name: request.full_name.clone(),
            products: self.tracking_config.products.clone(),
        };

        match self.tracking.create_user(&profile).await {
            Ok(external_id) => {
                info!(
                    ticket_key = %request.ticket_key,
                    email = %identity.email,
                    account_id = %external_id,
                    "Tracking account created"
                );
                Ok(StageOutcome::created(external_id))
            }
            Err(e) if e.is_already_exists() => {
                info!(
                    ticket_key = %request.ticket_key,
                    email = %identity.email,
                    "Tracking account appeared concurrently, treating as created"
                );
                Ok(StageOutcome::existing())
            }
            Err(e) => Err(StageError::from_service(STAGE, e)),
        }
    }
}

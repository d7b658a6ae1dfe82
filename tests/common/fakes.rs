//! Scripted in-memory implementations of the external service seams.
//!
//! Each fake records what was asked of it and can be primed with failures to
//! return before succeeding, which is how the scenario tests exercise the
//! retry and escalation paths without any real infrastructure.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use gangway::messaging::ResumeEnvelope;
use gangway::orchestration::{ResumeScheduler, ScheduleError};
use gangway::routing::Placement;
use gangway::services::{
    DirectoryService, DirectoryUser, EscalationSink, GrantCopySummary, GroupReplication,
    LicenseAssignment, LicenseService, NewAccountSpec, ServiceResult, StatusSink, TrackingProfile,
    TrackingService,
};

/// Corporate directory fake tracking created accounts by username
#[derive(Default)]
pub struct ScriptedDirectory {
    accounts: Mutex<HashSet<String>>,
    users: Mutex<HashMap<String, DirectoryUser>>,
    create_failures: Mutex<VecDeque<gangway::services::ServiceError>>,
    created_specs: Mutex<Vec<NewAccountSpec>>,
    pub sync_kicks: AtomicU32,
    pub copy_calls: AtomicU32,
}

impl ScriptedDirectory {
    /// Pretend this account existed before the workflow ran
    pub fn add_existing_account(&self, username: &str) {
        self.accounts.lock().insert(username.to_string());
    }

    /// Make a template user findable
    pub fn add_user(&self, username: &str) {
        self.users.lock().insert(
            username.to_string(),
            DirectoryUser {
                username: username.to_string(),
                display_name: None,
                distinguished_name: None,
            },
        );
    }

    /// Queue failures for the next `create_account` calls, oldest first
    pub fn fail_next_creates(&self, errors: Vec<gangway::services::ServiceError>) {
        self.create_failures.lock().extend(errors);
    }

    pub fn create_count(&self) -> usize {
        self.created_specs.lock().len()
    }

    pub fn last_created(&self) -> Option<NewAccountSpec> {
        self.created_specs.lock().last().cloned()
    }
}

#[async_trait]
impl DirectoryService for ScriptedDirectory {
    async fn account_exists(&self, username: &str, _placement: &Placement) -> ServiceResult<bool> {
        Ok(self.accounts.lock().contains(username))
    }

    async fn create_account(&self, spec: &NewAccountSpec) -> ServiceResult<String> {
        if let Some(err) = self.create_failures.lock().pop_front() {
            return Err(err);
        }
        self.accounts.lock().insert(spec.username.clone());
        self.created_specs.lock().push(spec.clone());
        Ok(format!("CN={},{}", spec.username, spec.placement.ou))
    }

    async fn find_user(
        &self,
        identifier: &str,
        _placement: &Placement,
    ) -> ServiceResult<Option<DirectoryUser>> {
        Ok(self.users.lock().get(identifier).cloned())
    }

    async fn copy_group_memberships(
        &self,
        _from: &DirectoryUser,
        _to_username: &str,
        _placement: &Placement,
    ) -> ServiceResult<GrantCopySummary> {
        self.copy_calls.fetch_add(1, Ordering::SeqCst);
        Ok(GrantCopySummary {
            copied: vec!["eng-all".to_string(), "vpn-users".to_string()],
            skipped: vec![],
            failed: vec![],
        })
    }

    async fn trigger_sync(&self, _placement: &Placement) -> ServiceResult<()> {
        self.sync_kicks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// License directory fake; accounts become visible only after the test marks
/// them synced
#[derive(Default)]
pub struct ScriptedLicense {
    synced: Mutex<HashSet<String>>,
    licensed: Mutex<HashSet<String>>,
    assign_failures: Mutex<VecDeque<gangway::services::ServiceError>>,
    pub usage_locations: Mutex<Vec<(String, String)>>,
}

impl ScriptedLicense {
    /// Simulate directory replication finishing for this address
    pub fn mark_synced(&self, email: &str) {
        self.synced.lock().insert(email.to_string());
    }

    /// Queue failures for the next `assign_license` calls, oldest first
    pub fn fail_next_assignments(&self, errors: Vec<gangway::services::ServiceError>) {
        self.assign_failures.lock().extend(errors);
    }

    pub fn is_licensed(&self, email: &str) -> bool {
        self.licensed.lock().contains(email)
    }
}

#[async_trait]
impl LicenseService for ScriptedLicense {
    async fn user_synced(&self, email: &str) -> ServiceResult<bool> {
        Ok(self.synced.lock().contains(email))
    }

    async fn set_usage_location(&self, email: &str, location: &str) -> ServiceResult<()> {
        self.usage_locations
            .lock()
            .push((email.to_string(), location.to_string()));
        Ok(())
    }

    async fn assign_license(&self, email: &str) -> ServiceResult<LicenseAssignment> {
        if let Some(err) = self.assign_failures.lock().pop_front() {
            return Err(err);
        }
        let already_assigned = !self.licensed.lock().insert(email.to_string());
        Ok(LicenseAssignment {
            sku: "ENTERPRISEPACK".to_string(),
            already_assigned,
        })
    }

    async fn replicate_groups(
        &self,
        _from_email: &str,
        _to_email: &str,
    ) -> ServiceResult<GroupReplication> {
        Ok(GroupReplication {
            added: vec!["cloud-eng".to_string()],
            skipped: vec![],
        })
    }
}

/// Project-tracking fake recording created profiles
#[derive(Default)]
pub struct ScriptedTracking {
    existing: Mutex<HashSet<String>>,
    created: Mutex<Vec<TrackingProfile>>,
}

impl ScriptedTracking {
    pub fn add_existing_user(&self, email: &str) {
        self.existing.lock().insert(email.to_string());
    }

    pub fn created_profiles(&self) -> Vec<TrackingProfile> {
        self.created.lock().clone()
    }
}

#[async_trait]
impl TrackingService for ScriptedTracking {
    async fn user_exists(&self, email: &str) -> ServiceResult<bool> {
        Ok(self.existing.lock().contains(email))
    }

    async fn create_user(&self, profile: &TrackingProfile) -> ServiceResult<String> {
        self.existing.lock().insert(profile.email.clone());
        self.created.lock().push(profile.clone());
        Ok("tracking-901".to_string())
    }
}

/// One recorded ticket update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPost {
    pub ticket_key: String,
    pub body: String,
    pub is_error: bool,
}

/// Records every ticket update the reporter delivers
#[derive(Default)]
pub struct RecordingStatusSink {
    posts: Mutex<Vec<StatusPost>>,
}

impl RecordingStatusSink {
    pub fn posts(&self) -> Vec<StatusPost> {
        self.posts.lock().clone()
    }

    pub fn posts_for(&self, ticket_key: &str) -> Vec<StatusPost> {
        self.posts
            .lock()
            .iter()
            .filter(|post| post.ticket_key == ticket_key)
            .cloned()
            .collect()
    }

    pub fn error_count(&self) -> usize {
        self.posts.lock().iter().filter(|post| post.is_error).count()
    }
}

#[async_trait]
impl StatusSink for RecordingStatusSink {
    async fn post_update(&self, ticket_key: &str, body: &str, is_error: bool) -> ServiceResult<()> {
        self.posts.lock().push(StatusPost {
            ticket_key: ticket_key.to_string(),
            body: body.to_string(),
            is_error,
        });
        Ok(())
    }
}

/// Records operator escalations as (subject, body) pairs
#[derive(Default)]
pub struct RecordingEscalation {
    notices: Mutex<Vec<(String, String)>>,
}

impl RecordingEscalation {
    pub fn notices(&self) -> Vec<(String, String)> {
        self.notices.lock().clone()
    }
}

#[async_trait]
impl EscalationSink for RecordingEscalation {
    async fn notify(&self, subject: &str, body: &str) -> ServiceResult<()> {
        self.notices
            .lock()
            .push((subject.to_string(), body.to_string()));
        Ok(())
    }
}

/// Captures scheduled wake-ups instead of delivering them, so tests control
/// exactly when a resume fires by feeding the envelope back themselves
#[derive(Default)]
pub struct RecordingScheduler {
    scheduled: Mutex<VecDeque<(ResumeEnvelope, DateTime<Utc>)>>,
    fail_all: AtomicBool,
}

impl RecordingScheduler {
    /// Make every schedule call fail from now on
    pub fn break_delivery(&self) {
        self.fail_all.store(true, Ordering::SeqCst);
    }

    /// Pop the oldest scheduled wake-up
    pub fn next_scheduled(&self) -> Option<(ResumeEnvelope, DateTime<Utc>)> {
        self.scheduled.lock().pop_front()
    }

    pub fn scheduled_count(&self) -> usize {
        self.scheduled.lock().len()
    }
}

#[async_trait]
impl ResumeScheduler for RecordingScheduler {
    async fn schedule_resume(
        &self,
        envelope: ResumeEnvelope,
        not_before: DateTime<Utc>,
    ) -> Result<(), ScheduleError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(ScheduleError::delivery("scripted delivery outage"));
        }
        self.scheduled.lock().push_back((envelope, not_before));
        Ok(())
    }
}

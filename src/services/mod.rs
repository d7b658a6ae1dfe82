//! # External Service Seams
//!
//! Trait boundaries for every external collaborator the workflow touches:
//! the corporate directory, the license/groupware directory, the
//! project-tracking system, and the two reporting sinks. The orchestration
//! layer is written entirely against these traits; production adapters and
//! test fakes both plug in here.
//!
//! Failures crossing a seam arrive pre-classified as [`ServiceError`], so
//! retry decisions upstream never need to inspect provider-specific detail.

pub mod directory;
pub mod errors;
pub mod license;
pub mod status;
pub mod tracking;

pub use directory::{DirectoryService, DirectoryUser, GrantCopySummary, NewAccountSpec};
pub use errors::{ServiceError, ServiceResult};
pub use license::{GroupReplication, LicenseAssignment, LicenseService};
pub use status::{EscalationSink, StatusSink};
pub use tracking::{TrackingProfile, TrackingService};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for inbound onboarding requests.
///
/// These are never retryable: the trigger payload itself is unusable and
/// redelivering it cannot change that.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Field {field} is blank")]
    BlankField { field: String },
}

impl RequestValidationError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn blank(field: impl Into<String>) -> Self {
        Self::BlankField {
            field: field.into(),
        }
    }
}

/// Raw employee payload as it arrives on the trigger envelope.
///
/// Everything is optional here; `OnboardingRequest::from_parts` decides what
/// is actually required. `replicateAccessFrom` is accepted as an alias for
/// `copyAccessFrom` because both shapes exist in the wild.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmployeeData {
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub department: Option<String>,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub manager: Option<String>,
    #[serde(alias = "replicateAccessFrom")]
    pub copy_access_from: Option<String>,
    pub work_location: Option<String>,
    pub start_date: Option<String>,
    pub email: Option<String>,
}

/// Validated, immutable input for one onboarding workflow.
///
/// Constructed exactly once per correlation identifier from the trigger
/// envelope and then snapshotted into [`WorkflowState`] so deferred re-entry
/// never needs the original payload again.
///
/// [`WorkflowState`]: crate::models::WorkflowState
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRequest {
    /// Correlation identifier tying every invocation, status report and
    /// state record together
    pub ticket_key: String,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub department: String,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub manager: Option<String>,
    /// Template user whose group memberships are copied to the new account
    pub copy_access_from: Option<String>,
    pub work_location: Option<String>,
    pub start_date: Option<String>,
    /// Supplied address overrides canonical derivation when present
    pub email: Option<String>,
}

impl OnboardingRequest {
    /// Build a validated request from a ticket key and the raw employee
    /// payload.
    ///
    /// `fullName` and `department` are required and must be non-blank. When
    /// `firstName`/`lastName` are absent they are split out of `fullName` on
    /// the first whitespace; a single-token full name is used for both.
    pub fn from_parts(
        ticket_key: impl Into<String>,
        data: EmployeeData,
    ) -> Result<Self, RequestValidationError> {
        let ticket_key = ticket_key.into();
        if ticket_key.trim().is_empty() {
            return Err(RequestValidationError::missing("ticketKey"));
        }

        let full_name = required(data.full_name, "fullName")?;
        let department = required(data.department, "department")?;

        let (derived_first, derived_last) = split_full_name(&full_name);
        let first_name = data
            .first_name
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(derived_first);
        let last_name = data
            .last_name
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(derived_last);

        Ok(Self {
            ticket_key,
            full_name,
            first_name,
            last_name,
            department,
            job_title: data.job_title,
            company: data.company,
            manager: data.manager,
            copy_access_from: data.copy_access_from,
            work_location: data.work_location,
            start_date: data.start_date,
            email: data.email,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, RequestValidationError> {
    match value {
        None => Err(RequestValidationError::missing(field)),
        Some(s) if s.trim().is_empty() => Err(RequestValidationError::blank(field)),
        Some(s) => Ok(s),
    }
}

/// Split a full name on the first whitespace. A single token stands in for
/// both halves.
fn split_full_name(full_name: &str) -> (String, String) {
    let trimmed = full_name.trim();
    match trimmed.split_once(' ') {
        Some((first, rest)) => (first.to_string(), rest.to_string()),
        None => (trimmed.to_string(), trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_data() -> EmployeeData {
        EmployeeData {
            full_name: Some("Jane van der Berg".to_string()),
            department: Some("IT Operations".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_name_splitting_on_first_space() {
        let request = OnboardingRequest::from_parts("HR-100", base_data()).unwrap();
        assert_eq!(request.first_name, "Jane");
        assert_eq!(request.last_name, "van der Berg");
    }

    #[test]
    fn test_single_token_name_used_for_both_halves() {
        let mut data = base_data();
        data.full_name = Some("Cher".to_string());
        let request = OnboardingRequest::from_parts("HR-101", data).unwrap();
        assert_eq!(request.first_name, "Cher");
        assert_eq!(request.last_name, "Cher");
    }

    #[test]
    fn test_explicit_names_win_over_derivation() {
        let mut data = base_data();
        data.first_name = Some("Janet".to_string());
        data.last_name = Some("Berg".to_string());
        let request = OnboardingRequest::from_parts("HR-102", data).unwrap();
        assert_eq!(request.first_name, "Janet");
        assert_eq!(request.last_name, "Berg");
    }

    #[test]
    fn test_missing_required_fields_rejected() {
        let mut data = base_data();
        data.full_name = None;
        assert_eq!(
            OnboardingRequest::from_parts("HR-103", data).unwrap_err(),
            RequestValidationError::missing("fullName")
        );

        let mut data = base_data();
        data.department = Some("   ".to_string());
        assert_eq!(
            OnboardingRequest::from_parts("HR-104", data).unwrap_err(),
            RequestValidationError::blank("department")
        );

        assert!(OnboardingRequest::from_parts("", base_data()).is_err());
    }

    #[test]
    fn test_copy_access_alias_accepted() {
        let json = r#"{"fullName": "Sam Poole", "department": "Finance", "replicateAccessFrom": "t.emplate"}"#;
        let data: EmployeeData = serde_json::from_str(json).unwrap();
        assert_eq!(data.copy_access_from.as_deref(), Some("t.emplate"));
    }

    #[test]
    fn test_request_snapshot_round_trips() {
        let request = OnboardingRequest::from_parts("HR-105", base_data()).unwrap();
        let json = serde_json::to_string(&request).unwrap();
        let parsed: OnboardingRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, request);
    }
}

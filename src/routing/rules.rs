use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::models::OnboardingRequest;

/// Errors raised while loading or validating a placement rule set
#[derive(Error, Debug)]
pub enum PlacementConfigError {
    #[error("Placement rules parse error: {message}")]
    Parse { message: String },

    #[error("Placement rule {index} is invalid: {reason}")]
    InvalidRule { index: usize, reason: String },

    #[error("Default placement is invalid: {reason}")]
    InvalidDefault { reason: String },
}

impl From<serde_json::Error> for PlacementConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            message: err.to_string(),
        }
    }
}

/// Where an account lands: mail/directory domain plus organizational unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub domain: String,
    pub ou: String,
    /// Short legacy domain name, defaulted from the first domain label
    pub netbios_domain: String,
}

/// Target half of a rule (and the shape of the default placement)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementTarget {
    pub domain: String,
    pub ou: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub netbios_domain: Option<String>,
}

impl PlacementTarget {
    fn to_placement(&self) -> Placement {
        let netbios_domain = self.netbios_domain.clone().unwrap_or_else(|| {
            self.domain
                .split('.')
                .next()
                .unwrap_or_default()
                .to_uppercase()
        });
        Placement {
            domain: self.domain.clone(),
            ou: self.ou.clone(),
            netbios_domain,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.domain.trim().is_empty() {
            return Err("domain must not be empty".to_string());
        }
        if self.ou.trim().is_empty() {
            return Err("ou must not be empty".to_string());
        }
        Ok(())
    }
}

/// Predicate half of a rule.
///
/// Condition groups are alternatives: the rule matches when any present
/// group matches. A rule with no groups at all matches every request, which
/// makes a catch-all rule expressible above the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleConditions {
    pub departments: Option<Vec<String>>,
    pub locations: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
}

impl RuleConditions {
    /// True when no condition group is present at all
    pub fn is_unconditional(&self) -> bool {
        self.departments.is_none() && self.locations.is_none() && self.keywords.is_none()
    }

    fn matches(&self, request: &OnboardingRequest) -> bool {
        if self.is_unconditional() {
            return true;
        }

        let department = request.department.to_lowercase();
        if let Some(departments) = &self.departments {
            if contains_any(&department, departments) {
                return true;
            }
        }

        if let Some(locations) = &self.locations {
            let location = request
                .work_location
                .as_deref()
                .unwrap_or_default()
                .to_lowercase();
            if contains_any(&location, locations) {
                return true;
            }
        }

        if let Some(keywords) = &self.keywords {
            let haystack = format!(
                "{} {} {} {}",
                request.department,
                request.work_location.as_deref().unwrap_or_default(),
                request.company.as_deref().unwrap_or_default(),
                request.full_name
            )
            .to_lowercase();
            if contains_any(&haystack, keywords) {
                return true;
            }
        }

        false
    }
}

/// Substring containment, rule value inside the request field. A rule value
/// of "it" matches the department "IT Operations".
fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles
        .iter()
        .any(|needle| haystack.contains(&needle.to_lowercase()))
}

/// One routing rule: conditions plus the placement it routes to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRule {
    #[serde(default)]
    pub conditions: RuleConditions,
    #[serde(flatten)]
    pub target: PlacementTarget,
}

/// Outcome of a resolution, carrying the coverage-gap flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementResolution {
    pub placement: Placement,
    /// Which rule matched, by position. `None` means the default was used.
    pub matched_rule: Option<usize>,
    pub used_default: bool,
}

/// Ordered placement rule set with a mandatory default.
///
/// Deserialized once at startup and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRules {
    #[serde(default)]
    pub rules: Vec<PlacementRule>,
    pub default: PlacementTarget,
}

/// Placeholder placement so default configuration validates; real
/// deployments override this section
impl Default for PlacementRules {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            default: PlacementTarget {
                domain: "corp.example".to_string(),
                ou: "OU=Staff,DC=corp,DC=example".to_string(),
                netbios_domain: None,
            },
        }
    }
}

impl PlacementRules {
    /// Parse a rule set from its JSON form (the shape stored in the rules
    /// secret bundle) and validate it.
    pub fn from_json_str(raw: &str) -> Result<Self, PlacementConfigError> {
        let rules: Self = serde_json::from_str(raw)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Check every rule target and the default for usable values
    pub fn validate(&self) -> Result<(), PlacementConfigError> {
        for (index, rule) in self.rules.iter().enumerate() {
            rule.target
                .validate()
                .map_err(|reason| PlacementConfigError::InvalidRule { index, reason })?;
        }
        self.default
            .validate()
            .map_err(|reason| PlacementConfigError::InvalidDefault { reason })?;
        Ok(())
    }

    /// Resolve the placement for a request.
    ///
    /// Pure and deterministic: rules are evaluated top to bottom and the
    /// first match short-circuits. No match falls back to the default, which
    /// is flagged and logged so coverage gaps get noticed, never an error.
    pub fn resolve(&self, request: &OnboardingRequest) -> PlacementResolution {
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.conditions.matches(request) {
                return PlacementResolution {
                    placement: rule.target.to_placement(),
                    matched_rule: Some(index),
                    used_default: false,
                };
            }
        }

        warn!(
            ticket_key = %request.ticket_key,
            department = %request.department,
            work_location = request.work_location.as_deref().unwrap_or(""),
            "No placement rule matched, falling back to default placement"
        );

        PlacementResolution {
            placement: self.default.to_placement(),
            matched_rule: None,
            used_default: true,
        }
    }
}

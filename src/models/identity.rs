use serde::{Deserialize, Serialize};
use std::fmt;

use super::request::OnboardingRequest;

/// Address layout for canonical email derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmailFormat {
    /// `j.smith@domain`
    #[serde(rename = "firstinitial.lastname")]
    FirstInitialLastName,
    /// `jane.smith@domain`
    #[serde(rename = "firstname.lastname")]
    FirstNameLastName,
}

impl Default for EmailFormat {
    fn default() -> Self {
        Self::FirstNameLastName
    }
}

impl fmt::Display for EmailFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstInitialLastName => write!(f, "firstinitial.lastname"),
            Self::FirstNameLastName => write!(f, "firstname.lastname"),
        }
    }
}

impl std::str::FromStr for EmailFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "firstinitial.lastname" => Ok(Self::FirstInitialLastName),
            "firstname.lastname" => Ok(Self::FirstNameLastName),
            _ => Err(format!("Invalid email format: {s}")),
        }
    }
}

/// The deterministic external identity derived for a new employee.
///
/// Both fields are pure functions of the request plus routing output, so any
/// invocation for the same correlation identifier lands on the same account.
/// That determinism is what makes the existence checks in the stage executors
/// meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalIdentity {
    pub email: String,
    pub username: String,
}

impl CanonicalIdentity {
    /// Derive the identity for a request in the given mail domain. A supplied
    /// request email wins over derivation; the username always comes from the
    /// effective email's local part.
    pub fn derive(request: &OnboardingRequest, format: EmailFormat, domain: &str) -> Self {
        let email = match request.email.as_deref().map(str::trim) {
            Some(supplied) if !supplied.is_empty() => supplied.to_ascii_lowercase(),
            _ => canonical_email(&request.first_name, &request.last_name, format, domain),
        };
        let username = username_from_email(&email);
        Self { email, username }
    }
}

/// Build the canonical address: lowercase, alphanumerics only, formatted per
/// `EmailFormat`. An empty sanitized first name degrades to `lastname@domain`
/// so hyphen-only or unicode-punctuation names still produce something
/// deliverable.
pub fn canonical_email(
    first_name: &str,
    last_name: &str,
    format: EmailFormat,
    domain: &str,
) -> String {
    let first = sanitize(first_name);
    let last = sanitize(last_name);

    let local = if first.is_empty() {
        last
    } else {
        match format {
            EmailFormat::FirstInitialLastName => {
                // first char of the sanitized name, one allocation either way
                let initial: String = first.chars().take(1).collect();
                format!("{initial}.{last}")
            }
            EmailFormat::FirstNameLastName => format!("{first}.{last}"),
        }
    };

    format!("{local}@{domain}")
}

/// Directory account name: local part of the email, capped at the legacy
/// 20-character account-name limit.
pub fn username_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    local.chars().take(20).collect()
}

fn sanitize(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::request::EmployeeData;

    fn request_named(full_name: &str) -> OnboardingRequest {
        OnboardingRequest::from_parts(
            "HR-1",
            EmployeeData {
                full_name: Some(full_name.to_string()),
                department: Some("IT".to_string()),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_first_initial_format() {
        assert_eq!(
            canonical_email("Jane", "Smith", EmailFormat::FirstInitialLastName, "corp.example"),
            "j.smith@corp.example"
        );
    }

    #[test]
    fn test_full_first_name_format() {
        assert_eq!(
            canonical_email("Jane", "Smith", EmailFormat::FirstNameLastName, "corp.example"),
            "jane.smith@corp.example"
        );
    }

    #[test]
    fn test_punctuation_and_spaces_stripped() {
        assert_eq!(
            canonical_email(
                "Mary-Anne",
                "O'Brien Lee",
                EmailFormat::FirstNameLastName,
                "corp.example"
            ),
            "maryanne.obrienlee@corp.example"
        );
    }

    #[test]
    fn test_empty_first_name_degrades_to_lastname() {
        assert_eq!(
            canonical_email("--", "Smith", EmailFormat::FirstInitialLastName, "corp.example"),
            "smith@corp.example"
        );
        assert_eq!(
            canonical_email("", "Smith", EmailFormat::FirstNameLastName, "corp.example"),
            "smith@corp.example"
        );
    }

    #[test]
    fn test_username_truncated_to_twenty_chars() {
        let email = "konstantinos.papadopoulos@corp.example";
        let username = username_from_email(email);
        assert_eq!(username, "konstantinos.papadop");
        assert_eq!(username.chars().count(), 20);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let request = request_named("Jane Smith");
        let a = CanonicalIdentity::derive(&request, EmailFormat::FirstInitialLastName, "corp.example");
        let b = CanonicalIdentity::derive(&request, EmailFormat::FirstInitialLastName, "corp.example");
        assert_eq!(a, b);
        assert_eq!(a.email, "j.smith@corp.example");
        assert_eq!(a.username, "j.smith");
    }

    #[test]
    fn test_supplied_email_overrides_derivation() {
        let mut request = request_named("Jane Smith");
        request.email = Some("JSmith@Legacy.Example".to_string());
        let identity =
            CanonicalIdentity::derive(&request, EmailFormat::FirstNameLastName, "corp.example");
        assert_eq!(identity.email, "jsmith@legacy.example");
        assert_eq!(identity.username, "jsmith");
    }

    #[test]
    fn test_single_token_name_derivation() {
        let request = request_named("Cher");
        let identity =
            CanonicalIdentity::derive(&request, EmailFormat::FirstInitialLastName, "corp.example");
        assert_eq!(identity.email, "c.cher@corp.example");
    }
}

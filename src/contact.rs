//! Contact-form validation.
//!
//! Validation is local only. Every rule is checked and all violations are
//! reported together; a valid form proceeds to [`submit`], which transmits
//! nothing.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

const MIN_NAME_CHARS: usize = 2;
const MIN_MESSAGE_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Violation {
    NameTooShort,
    InvalidEmail,
    MessageTooShort,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::NameTooShort => write!(f, "Name must be at least 2 characters long"),
            Violation::InvalidEmail => write!(f, "Please enter a valid email address"),
            Violation::MessageTooShort => write!(f, "Message must be at least 10 characters long"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("contact form has {} invalid field(s): {}", .violations.len(), render(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

fn render(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// The three fields the form posts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactForm {
    /// Missing fields read as empty, like an absent `FormData` entry.
    pub fn from_fields(fields: &BTreeMap<String, String>) -> Self {
        let get = |key: &str| fields.get(key).cloned().unwrap_or_default();
        Self {
            name: get("name"),
            email: get("email"),
            message: get("message"),
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

pub fn validate(form: &ContactForm) -> Result<(), ValidationError> {
    let mut violations = Vec::new();
    if form.name.trim().chars().count() < MIN_NAME_CHARS {
        violations.push(Violation::NameTooShort);
    }
    if !is_valid_email(&form.email) {
        violations.push(Violation::InvalidEmail);
    }
    if form.message.trim().chars().count() < MIN_MESSAGE_CHARS {
        violations.push(Violation::MessageTooShort);
    }
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { violations })
    }
}

/// Result of the submission step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Submission {
    /// Accepted locally; nothing was sent anywhere.
    Accepted { form: ContactForm },
    Rejected { violations: Vec<Violation> },
}

/// Validate and hand off. Violations go to the log, which is the only
/// feedback channel the page has.
pub fn submit(form: ContactForm) -> Submission {
    match validate(&form) {
        Ok(()) => {
            tracing::info!(name = %form.name, email = %form.email, "submitting contact form");
            Submission::Accepted { form }
        }
        Err(err) => {
            tracing::warn!(errors = %render(&err.violations), "contact form validation failed");
            Submission::Rejected {
                violations: err.violations,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, message: &str) -> ContactForm {
        ContactForm {
            name: name.into(),
            email: email.into(),
            message: message.into(),
        }
    }

    #[test]
    fn collects_every_violation() {
        let err = validate(&form("A", "bad", "short")).unwrap_err();
        assert_eq!(
            err.violations,
            vec![
                Violation::NameTooShort,
                Violation::InvalidEmail,
                Violation::MessageTooShort
            ]
        );
        assert!(err.to_string().starts_with("contact form has 3 invalid field(s)"));
    }

    #[test]
    fn valid_form_is_accepted() {
        let f = form("Alice", "a@b.com", "Hello there, this works.");
        assert!(validate(&f).is_ok());
        assert_eq!(submit(f.clone()), Submission::Accepted { form: f });
    }

    #[test]
    fn lengths_ignore_surrounding_whitespace() {
        let err = validate(&form("  A  ", "a@b.co", "   123456789   ")).unwrap_err();
        assert_eq!(
            err.violations,
            vec![Violation::NameTooShort, Violation::MessageTooShort]
        );
    }

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("x@y.z"));
        assert!(!is_valid_email("x@y"));
        assert!(!is_valid_email("x y@z.com"));
        assert!(!is_valid_email("@z.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn missing_fields_read_as_empty() {
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), "Bob".to_string());
        let f = ContactForm::from_fields(&fields);
        assert_eq!(f.email, "");
        match submit(f) {
            Submission::Rejected { violations } => assert_eq!(
                violations,
                vec![Violation::InvalidEmail, Violation::MessageTooShort]
            ),
            other => panic!("expected rejection, got {other:?}"),
        }
    }
}

//! Core types used throughout the crate.

use thiserror::Error;

/// A single problem found while validating user or configuration input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid value for '{field_path}': {message}")]
pub struct ValidationError {
    /// Path to the offending field (e.g., "alternateLanguages[1]", "email")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

/// Renders a numbered list, one validation error per line.
#[must_use]
pub fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Minimal plausibility check: something on both sides of an `@`, and a dot
/// in the domain.
pub(crate) fn check_email(email: &str, errors: &mut Vec<ValidationError>) {
    let email = email.trim();
    if email.is_empty() {
        errors.push(ValidationError::new("email", "An email address is required"));
        return;
    }
    let plausible = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
    });
    if !plausible {
        errors.push(ValidationError::new(
            "email",
            format!("'{email}' is not a valid email address"),
        ));
    }
}

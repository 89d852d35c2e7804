//! Contact submission validation.
//!
//! Checks every field against its declared constraints and collects the
//! full list of violations rather than stopping at the first one. Runs on
//! raw, unsanitized input so length and character-class checks are exact.

use serde::{Deserialize, Serialize};

/// A contact form submission, as decoded from the request body.
///
/// Fields default to empty strings so a syntactically valid JSON body with
/// missing fields surfaces as per-field violations, not a parse error.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "csrfToken")]
    pub csrf_token: String,
}

/// A single field-level constraint violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

impl ContactSubmission {
    /// Validate all fields, returning every violation found.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        check_name(&self.name, &mut errors);
        check_email(&self.email, &mut errors);
        check_length(
            "subject",
            &self.subject,
            3,
            200,
            "Subject must be at least 3 characters",
            "Subject must be less than 200 characters",
            &mut errors,
        );
        check_length(
            "message",
            &self.message,
            10,
            2000,
            "Message must be at least 10 characters",
            "Message must be less than 2000 characters",
            &mut errors,
        );
        if self.csrf_token.is_empty() {
            errors.push(FieldError::new("csrfToken", "CSRF token required"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
    too_short: &'static str,
    too_long: &'static str,
    errors: &mut Vec<FieldError>,
) {
    let len = value.chars().count();
    if len < min {
        errors.push(FieldError::new(field, too_short));
    } else if len > max {
        errors.push(FieldError::new(field, too_long));
    }
}

fn check_name(name: &str, errors: &mut Vec<FieldError>) {
    check_length(
        "name",
        name,
        2,
        100,
        "Name must be at least 2 characters",
        "Name must be less than 100 characters",
        errors,
    );
    if !name.is_empty() && !name.chars().all(is_name_char) {
        errors.push(FieldError::new("name", "Name contains invalid characters"));
    }
}

// Letters (including the defined accented set), spaces, hyphens
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphabetic()
        || matches!(c, 'ä' | 'ö' | 'ü' | 'Ä' | 'Ö' | 'Ü' | 'ß')
        || c.is_whitespace()
        || c == '-'
}

fn check_email(email: &str, errors: &mut Vec<FieldError>) {
    if email.chars().count() > 255 {
        errors.push(FieldError::new("email", "Email is too long"));
    }
    if !is_valid_email(email) {
        errors.push(FieldError::new("email", "Invalid email address"));
    }
}

/// Standard address grammar: one `@`, a sane local part, a dotted domain.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    // Local part: 1-64 chars from the common unquoted set, no leading,
    // trailing, or doubled dots
    if local.is_empty()
        || local.len() > 64
        || local.starts_with('.')
        || local.ends_with('.')
        || local.contains("..")
    {
        return false;
    }
    let local_ok = local.chars().all(|c| {
        c.is_ascii_alphanumeric() || ".!#$%&'*+/=?^_`{|}~-".contains(c)
    });
    if !local_ok {
        return false;
    }

    // Domain: at least two dot-separated labels of alphanumerics/hyphens,
    // no label starting or ending with a hyphen
    if domain.contains('@') || !domain.contains('.') {
        return false;
    }
    domain.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

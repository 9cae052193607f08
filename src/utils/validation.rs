//! Validation Utilities
//!
//! Input validation functions for user data and API requests.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;
use validator::ValidationError;

/// Validates email address format
pub fn validate_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    regex.is_match(email.trim())
}

/// Normalizes email address to lowercase and removes whitespace
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates that a name contains only allowed characters and length
pub fn validate_name(name: &str) -> bool {
    let trimmed = name.trim();

    if trimmed.is_empty() || trimmed.len() > 255 {
        return false;
    }

    // Allow letters, spaces, hyphens, and apostrophes
    static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = NAME_REGEX
        .get_or_init(|| Regex::new(r"^[\p{L}\s\-']+$").expect("Failed to compile name regex"));

    regex.is_match(trimmed)
}

/// Validates an http(s) URL such as a restaurant website
pub fn validate_url(url: &str) -> bool {
    static URL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = URL_REGEX.get_or_init(|| {
        Regex::new(r"^https?://(www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_+.~#?&/=]*)$")
            .expect("Failed to compile URL regex")
    });

    regex.is_match(url) && url.len() <= 512
}

/// Validates a password: at least 6 word characters, one of them a digit
pub fn validate_password(password: &str) -> bool {
    password.chars().count() >= 6
        && password
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Lowercase, URL-safe slug of a display name
///
/// Runs of characters outside `[a-z0-9]` collapse into a single `-`, and
/// leading or trailing separators are dropped.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Custom validator for email fields using the validator crate
pub fn email_validator(email: &str) -> Result<(), ValidationError> {
    if validate_email(email) {
        Ok(())
    } else {
        Err(invalid("invalid_email", messages::INVALID_EMAIL))
    }
}

/// Custom validator for name fields using the validator crate
pub fn name_validator(name: &str) -> Result<(), ValidationError> {
    if validate_name(name) {
        Ok(())
    } else {
        Err(invalid("invalid_name", messages::INVALID_NAME))
    }
}

/// Custom validator for URL fields using the validator crate
pub fn url_validator(url: &str) -> Result<(), ValidationError> {
    if validate_url(url) {
        Ok(())
    } else {
        Err(invalid("invalid_url", messages::INVALID_URL))
    }
}

/// Custom validator for password fields using the validator crate
pub fn password_validator(password: &str) -> Result<(), ValidationError> {
    if validate_password(password) {
        Ok(())
    } else {
        Err(invalid("invalid_password", messages::INVALID_PASSWORD))
    }
}

/// Rejects strings that are empty once trimmed
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(invalid("blank", messages::FIELD_REQUIRED))
    } else {
        Ok(())
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Validation error messages for user-friendly responses
pub mod messages {
    pub const INVALID_EMAIL: &str = "Please add a valid email";
    pub const INVALID_NAME: &str =
        "Name must contain only letters, spaces, hyphens, and apostrophes";
    pub const INVALID_URL: &str = "Please use a valid URL with HTTP or HTTPS";
    pub const INVALID_PASSWORD: &str =
        "Password must be at least 6 letters, digits or underscores and contain a digit";
    pub const FIELD_REQUIRED: &str = "This field is required";
}

//! Common validation utilities.

use validator::ValidationError;

/// Maximum length of a stored user agent string.
pub const MAX_USER_AGENT_LENGTH: usize = 500;

/// Maximum length of a stored requester IP address (fits IPv6).
pub const MAX_IP_ADDRESS_LENGTH: usize = 45;

/// Validates that a string contains at least one non-whitespace character.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value cannot be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates a premade template identifier.
///
/// Identifiers are slugs or UUID strings: alphanumerics, hyphens, underscores and dots.
pub fn validate_template_id(id: &str) -> Result<(), ValidationError> {
    let valid = !id.is_empty()
        && id.len() <= 100
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');

    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_template_id");
        err.message = Some(
            "Template ID may only contain alphanumeric characters, hyphens, underscores and dots"
                .into(),
        );
        Err(err)
    }
}

/// Reduces an uploaded file name to its final path component with a safe character set.
///
/// Returns `"upload"` when nothing usable remains.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.chars().take(200).collect()
    }
}

/// Truncates a string to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// Case-insensitive email comparison used for ownership checks.
pub fn emails_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

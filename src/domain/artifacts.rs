//! Input normalisation for artifact and comment mutations.

use super::error::DomainError;

pub const MAX_PROMPT_CHARS: usize = 4000;
pub const MAX_COMMENT_CHARS: usize = 2000;
pub const MAX_LABEL_CHARS: usize = 120;
pub const MAX_IDENTIFIER_CHARS: usize = 128;
pub const MAX_URL_CHARS: usize = 2048;

/// Trim `value` and require it to be non-empty and at most `max_chars` long.
pub fn required_text(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    ensure_length(field, trimmed, max_chars)?;
    Ok(trimmed.to_string())
}

/// Trim `value`, allowing it to be empty.
pub fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max_chars: usize,
) -> Result<String, DomainError> {
    let trimmed = value.map(str::trim).unwrap_or_default();
    ensure_length(field, trimmed, max_chars)?;
    Ok(trimmed.to_string())
}

/// Identifiers are opaque but must be non-empty and free of whitespace.
pub fn identifier(field: &'static str, value: &str) -> Result<String, DomainError> {
    let id = required_text(field, value, MAX_IDENTIFIER_CHARS)?;
    if id.chars().any(char::is_whitespace) {
        return Err(DomainError::validation(field, "must not contain whitespace"));
    }
    Ok(id)
}

pub fn image_reference(value: &str) -> Result<String, DomainError> {
    let reference = required_text("image_url", value, MAX_URL_CHARS)?;
    if reference.chars().any(char::is_whitespace) {
        return Err(DomainError::validation(
            "image_url",
            "must be a URL or storage path without whitespace",
        ));
    }
    Ok(reference)
}

fn ensure_length(field: &'static str, value: &str, max_chars: usize) -> Result<(), DomainError> {
    let count = value.chars().count();
    if count > max_chars {
        return Err(DomainError::validation(
            field,
            format!("must be at most {max_chars} characters (got {count})"),
        ));
    }
    Ok(())
}

//! Message content rules.

use spinandsell_core::error::DomainError;

/// Maximum message length in characters, after trimming.
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Trims `content` and checks it is non-empty and within
/// [`MAX_MESSAGE_CHARS`].
///
/// # Errors
///
/// Returns `DomainError::Validation` for empty or oversized content.
pub fn normalize_content(content: &str) -> Result<String, DomainError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(
            "message content is required".to_owned(),
        ));
    }
    if trimmed.chars().count() > MAX_MESSAGE_CHARS {
        return Err(DomainError::Validation(format!(
            "message cannot exceed {MAX_MESSAGE_CHARS} characters"
        )));
    }
    Ok(trimmed.to_owned())
}

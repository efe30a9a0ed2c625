//! Validation helpers for DTOs.

use validator::{ValidateEmail, ValidationError};

/// Longest request a player may write in the completion form.
pub const MAX_CONCERN_CHARS: usize = 1_000;

/// Validates an email address that may still be left blank.
///
/// A blank address is accepted here: completion reports it as an unmet precondition rather
/// than a malformed request.
///
/// # Examples
///
/// ```ignore
/// validate_optional_email("")                  // Ok
/// validate_optional_email("fox@b612.rose.com") // Ok
/// validate_optional_email("not-an-address")    // Err
/// ```
pub fn validate_optional_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() || email.validate_email() {
        return Ok(());
    }

    let mut err = ValidationError::new("email_format");
    err.message = Some("email must be a valid address".into());
    Err(err)
}

/// Validates the length of the free-form completion request.
pub fn validate_concern(concern: &str) -> Result<(), ValidationError> {
    let length = concern.chars().count();
    if length <= MAX_CONCERN_CHARS {
        return Ok(());
    }

    let mut err = ValidationError::new("concern_length");
    err.message = Some(
        format!("concern must be at most {MAX_CONCERN_CHARS} characters (got {length})").into(),
    );
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_email_is_left_to_the_service() {
        assert!(validate_optional_email("").is_ok());
        assert!(validate_optional_email("   ").is_ok());
    }

    #[test]
    fn email_format_is_checked() {
        assert!(validate_optional_email("fox@b612.rose.com").is_ok());
        assert!(validate_optional_email(" player@example.com ").is_ok());
        assert!(validate_optional_email("player").is_err());
        assert!(validate_optional_email("player@").is_err());
    }

    #[test]
    fn concern_length_counts_characters() {
        assert!(validate_concern(&"별".repeat(MAX_CONCERN_CHARS)).is_ok());
        assert!(validate_concern(&"a".repeat(MAX_CONCERN_CHARS + 1)).is_err());
    }
}

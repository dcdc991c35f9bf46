use crate::shared::error::{AppError, Result};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Input validation runs before any storage call; a failure here never
/// reaches the local or remote store.
pub fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    require_non_empty("email", email)?;
    let trimmed = email.trim();
    let mut parts = trimmed.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || trimmed.contains(' ') {
        return Err(AppError::Validation(format!(
            "'{}' is not a valid email address",
            trimmed
        )));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub fn validate_confirmation(password: &str, confirmation: &str) -> Result<()> {
    if password != confirmation {
        return Err(AppError::Validation(
            "password confirmation does not match".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_accepts_plain_address() {
        assert!(validate_email("a@x.com").is_ok());
    }

    #[test]
    fn test_validate_email_rejects_malformed() {
        assert!(validate_email("").is_err());
        assert!(validate_email("nodomain").is_err());
        assert!(validate_email("a@nodot").is_err());
        assert!(validate_email("a b@x.com").is_err());
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("secret1").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_confirmation() {
        assert!(validate_confirmation("secret1", "secret1").is_ok());
        assert!(validate_confirmation("secret1", "secret2").is_err());
    }
}

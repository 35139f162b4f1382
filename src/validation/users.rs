use crate::error::{AppError, Result};

/// Validates an email address. Deliberately shallow: final truth is the
/// unique index and, later, mail delivery. Rejects the obvious garbage.
pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        });

    if !valid {
        return Err(AppError::Validation("Not a valid email".to_string()));
    }

    Ok(())
}

/// Validates a display name.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }

    Ok(())
}

/// Validates a password.
pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < 6 {
        return Err(AppError::Validation(
            "Password too short - should be 6 chars minimum".to_string(),
        ));
    }

    if password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be at most 128 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates that the password confirmation matches.
pub fn validate_password_confirmation(password: &str, confirmation: &str) -> Result<()> {
    if password != confirmation {
        return Err(AppError::Validation("Passwords do not match".to_string()));
    }

    Ok(())
}

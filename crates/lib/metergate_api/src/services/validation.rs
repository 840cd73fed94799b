//! Signup input checks.

use metergate_core::auth::password::MAX_PASSWORD_BYTES;

use crate::error::{AppError, AppResult};

/// Column widths of the `users` table.
const MAX_USERNAME_CHARS: usize = 50;
const MAX_EMAIL_CHARS: usize = 100;

pub(crate) fn username(username: &str) -> AppResult<()> {
    if username.trim().is_empty() {
        return Err(AppError::Validation("Username must not be empty".into()));
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(AppError::Validation(format!(
            "Username must be at most {MAX_USERNAME_CHARS} characters"
        )));
    }
    Ok(())
}

pub(crate) fn email(email: &str) -> AppResult<()> {
    if email.chars().count() > MAX_EMAIL_CHARS || !is_email_shaped(email) {
        return Err(AppError::Validation("Invalid email address".into()));
    }
    Ok(())
}

pub(crate) fn password(password: &str) -> AppResult<()> {
    if password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::Validation(format!(
            "Password must be at most {MAX_PASSWORD_BYTES} bytes"
        )));
    }
    Ok(())
}

/// `local@domain.tld`: one `@`, no whitespace, a dotted domain without empty labels.
fn is_email_shaped(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

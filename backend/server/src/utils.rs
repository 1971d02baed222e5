//! Request validation helpers.
//!
//! Handlers collect human-readable messages into a `Vec` and fail the whole
//! request at once, so the frontend gets every violation in one round trip.

use crate::error::AppError;

pub fn check(errors: &mut Vec<String>, ok: bool, message: &str) {
    if !ok {
        errors.push(message.to_owned());
    }
}

pub fn finish(errors: Vec<String>) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn opt_not_blank(value: Option<&str>) -> bool {
    value.is_some_and(not_blank)
}

/// Loose phone check: 7 to 15 digits, separators allowed.
pub fn is_phone(value: &str) -> bool {
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    let valid_chars = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    (7..=15).contains(&digits) && valid_chars
}

pub fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

const PASSWORD_SPECIALS: &str = "@$!%*?&";

/// Minimum 8 characters, at least one uppercase letter, one lowercase letter,
/// one digit and one special character; nothing outside that alphabet.
pub fn is_strong_password(value: &str) -> bool {
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c));
    value.len() >= 8
        && allowed
        && value.chars().any(|c| c.is_ascii_lowercase())
        && value.chars().any(|c| c.is_ascii_uppercase())
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_accepts_separators() {
        assert!(is_phone("+91 98765-43210"));
        assert!(!is_phone("12345"));
        assert!(!is_phone("not a phone"));
    }

    #[test]
    fn email_needs_local_and_dotted_domain() {
        assert!(is_email("garage@example.com"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("garage@localhost"));
    }

    #[test]
    fn password_policy_matches_registration_rules() {
        assert!(is_strong_password("Work$hop1"));
        assert!(!is_strong_password("workshop1$"));
        assert!(!is_strong_password("Sh0rt$"));
        assert!(!is_strong_password("Work shop1$"));
    }
}

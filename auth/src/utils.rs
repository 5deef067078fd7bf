//! Input validation and the supported-currency table.

use crate::error::{AuthError, Result};

/// Minimum password length accepted at sign-up and sign-in.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Minimum username length accepted at profile setup.
pub const MIN_USERNAME_LEN: usize = 3;

/// Inclusive age range accepted at profile setup.
pub const AGE_RANGE: std::ops::RangeInclusive<u8> = 13..=120;

/// Validate email address shape.
///
/// Deliberately loose: anything of the form `something@something.something`
/// with no interior whitespace passes. The identity service performs the
/// authoritative validation.
///
/// # Examples
///
/// ```
/// use finanza_auth::utils::validate_email;
///
/// assert!(validate_email("user@example.com").is_ok());
/// assert!(validate_email("not-an-email").is_err());
/// assert!(validate_email("spaces in@local.part").is_err());
/// ```
///
/// # Errors
///
/// Returns [`AuthError::Validation`] when the shape check fails.
pub fn validate_email(email: &str) -> Result<()> {
    let ok = !email.contains(char::is_whitespace)
        && email.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty() && domain.split_once('.').is_some_and(|(host, tld)| {
                !host.is_empty() && !tld.is_empty()
            })
        });
    if ok {
        Ok(())
    } else {
        Err(AuthError::Validation(
            "please enter a valid email address".to_string(),
        ))
    }
}

/// Validate password length.
///
/// # Errors
///
/// Returns [`AuthError::Validation`] when the password is shorter than
/// [`MIN_PASSWORD_LEN`].
pub fn validate_password(password: &str) -> Result<()> {
    if password.len() >= MIN_PASSWORD_LEN {
        Ok(())
    } else {
        Err(AuthError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )))
    }
}

/// Validate a username.
///
/// # Errors
///
/// Returns [`AuthError::Validation`] when the trimmed username is shorter
/// than [`MIN_USERNAME_LEN`].
pub fn validate_username(username: &str) -> Result<()> {
    if username.trim().len() >= MIN_USERNAME_LEN {
        Ok(())
    } else {
        Err(AuthError::Validation(format!(
            "username must be at least {MIN_USERNAME_LEN} characters"
        )))
    }
}

/// Validate an alias.
///
/// # Errors
///
/// Returns [`AuthError::Validation`] when the alias is blank.
pub fn validate_alias(alias: &str) -> Result<()> {
    if alias.trim().is_empty() {
        Err(AuthError::Validation(
            "alias cannot be empty".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate an age.
///
/// # Errors
///
/// Returns [`AuthError::Validation`] when the age falls outside
/// [`AGE_RANGE`].
pub fn validate_age(age: u8) -> Result<()> {
    if AGE_RANGE.contains(&age) {
        Ok(())
    } else {
        Err(AuthError::Validation(format!(
            "age must be between {} and {}",
            AGE_RANGE.start(),
            AGE_RANGE.end()
        )))
    }
}

/// Validate the full set of profile fields supplied at setup.
///
/// # Errors
///
/// Returns [`AuthError::Validation`] when the username is too short, the
/// alias is blank, or the age falls outside [`AGE_RANGE`].
pub fn validate_profile_input(username: &str, alias: &str, age: u8) -> Result<()> {
    validate_username(username)?;
    validate_alias(alias)?;
    validate_age(age)
}

/// A currency the client can quote exchange rates for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Currency {
    /// ISO 4217 code.
    pub code: &'static str,

    /// Human-readable name.
    pub name: &'static str,

    /// Flag emoji for display.
    pub flag: &'static str,
}

/// All currencies the client supports, in display order.
pub const CURRENCIES: [Currency; 11] = [
    Currency { code: "USD", name: "US Dollar", flag: "🇺🇸" },
    Currency { code: "EUR", name: "Euro", flag: "🇪🇺" },
    Currency { code: "GBP", name: "British Pound", flag: "🇬🇧" },
    Currency { code: "JPY", name: "Japanese Yen", flag: "🇯🇵" },
    Currency { code: "CAD", name: "Canadian Dollar", flag: "🇨🇦" },
    Currency { code: "AUD", name: "Australian Dollar", flag: "🇦🇺" },
    Currency { code: "CHF", name: "Swiss Franc", flag: "🇨🇭" },
    Currency { code: "CNY", name: "Chinese Yuan", flag: "🇨🇳" },
    Currency { code: "INR", name: "Indian Rupee", flag: "🇮🇳" },
    Currency { code: "BRL", name: "Brazilian Real", flag: "🇧🇷" },
    Currency { code: "MXN", name: "Mexican Peso", flag: "🇲🇽" },
];

/// Look up a supported currency by ISO code.
#[must_use]
pub fn currency_by_code(code: &str) -> Option<&'static Currency> {
    CURRENCIES.iter().find(|c| c.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation_accepts_ordinary_addresses() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("first.last+tag@sub.domain.org").is_ok());
    }

    #[test]
    fn email_validation_rejects_malformed_addresses() {
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("@missing-local.com").is_err());
        assert!(validate_email("missing-domain@").is_err());
        assert!(validate_email("no-tld@domain").is_err());
        assert!(validate_email("white space@x.com").is_err());
    }

    #[test]
    fn password_validation_enforces_minimum_length() {
        assert!(validate_password("secret").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn profile_validation_covers_all_fields() {
        assert!(validate_profile_input("user1", "User One", 30).is_ok());
        assert!(validate_profile_input("ab", "User", 30).is_err());
        assert!(validate_profile_input("user1", "   ", 30).is_err());
        assert!(validate_profile_input("user1", "User", 12).is_err());
        assert!(validate_profile_input("user1", "User", 121).is_err());
        assert!(validate_profile_input("user1", "User", 13).is_ok());
        assert!(validate_profile_input("user1", "User", 120).is_ok());
    }

    #[test]
    fn currency_table_lookup() {
        assert_eq!(currency_by_code("EUR").map(|c| c.name), Some("Euro"));
        assert!(currency_by_code("XYZ").is_none());
        assert_eq!(CURRENCIES.len(), 11);
    }
}

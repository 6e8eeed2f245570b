use std::sync::LazyLock;

use regex::Regex;

use super::ValidationError;

/// Minimum characters in a display name
pub const MIN_NAME_LENGTH: usize = 2;

/// Minimum characters in a password
pub const MIN_PASSWORD_LENGTH: usize = 8;

// local@domain.tld with no whitespace and a single @
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern")
});

/// Emails are compared as stored, so surrounding whitespace is the only
/// thing removed.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_string()
}

/// # Errors
///
/// Returns a `ValidationError` if the address does not look like `local@domain.tld`
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_PATTERN.is_match(email.trim()) {
        Ok(())
    } else {
        Err(ValidationError::new("Invalid email format"))
    }
}

/// # Errors
///
/// Returns a `ValidationError` if the trimmed name is shorter than two characters
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().chars().count() >= MIN_NAME_LENGTH {
        Ok(())
    } else {
        Err(ValidationError::new(format!(
            "Name must be at least {MIN_NAME_LENGTH} characters"
        )))
    }
}

/// # Errors
///
/// Returns a `ValidationError` if the password is shorter than eight characters
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() >= MIN_PASSWORD_LENGTH {
        Ok(())
    } else {
        Err(ValidationError::new(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        for ok in ["a@x.com", "first.last@sub.example.org", " a@x.com "] {
            assert!(validate_email(ok).is_ok(), "{ok} should be accepted");
        }
        for bad in ["", "a", "a@x", "@x.com", "a@@x.com", "a b@x.com", "a@x."] {
            assert!(validate_email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Al").is_ok());
        assert!(validate_name(" A ").is_err());
        assert_eq!(
            validate_name("").unwrap_err().to_string(),
            "Name must be at least 2 characters"
        );
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("1234567").is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  a@x.com\n"), "a@x.com");
    }
}

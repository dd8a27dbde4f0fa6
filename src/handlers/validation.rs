//! Request validation helpers. Validation stays plain functions: parse,
//! validate, call the service, map the result.

use std::collections::HashMap;

use crate::error::ApiError;

/// Collects field-level validation failures, first message per field
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: HashMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Finish validation: empty map passes, anything else becomes a 422
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::unprocessable_entity("Validation Error", self.errors))
        }
    }
}

/// Basic email format check
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || !email.contains('@') {
        return false;
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return false;
    }

    // Domain needs at least one dot with content around it
    let domain = parts[1];
    domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Minimum length rule applied at login
pub fn meets_password_minimum(password: &str) -> bool {
    password.len() >= 8
}

/// Stronger rule applied when setting a password: length plus mixed case
/// and at least one digit
pub fn is_strong_password(password: &str) -> bool {
    meets_password_minimum(password)
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Hex color of the `#RRGGBB` form
pub fn is_valid_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("editor@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("user@.com"));
    }

    #[test]
    fn password_rules() {
        assert!(meets_password_minimum("12345678"));
        assert!(!meets_password_minimum("1234567"));

        assert!(is_strong_password("Sup3rSecret"));
        assert!(!is_strong_password("alllowercase1"));
        assert!(!is_strong_password("ALLUPPERCASE1"));
        assert!(!is_strong_password("NoDigitsHere"));
        assert!(!is_strong_password("Sh0rt"));
    }

    #[test]
    fn hex_colors() {
        assert!(is_valid_hex_color("#3B82F6"));
        assert!(is_valid_hex_color("#000000"));
        assert!(!is_valid_hex_color("3B82F6"));
        assert!(!is_valid_hex_color("#3B82F"));
        assert!(!is_valid_hex_color("#GGGGGG"));
    }

    #[test]
    fn field_errors_keep_first_message_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("email", "Email address is required.");
        errors.add("email", "Second message is ignored.");

        let err = errors.into_result().unwrap_err();
        let body = err.to_json();
        assert_eq!(body["details"]["email"], "Email address is required.");
    }
}

//! Request shape validation.
//!
//! Each request payload implements [`Validate`] and reports every problem it
//! finds; handlers reject the request when the list is non-empty.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::AppError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid regex")
});

static HEX_COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([A-Fa-f0-9]{6}|[A-Fa-f0-9]{3})$").expect("valid regex"));

pub const MIN_PASSWORD_LEN: usize = 8;

pub trait Validate {
    /// Returns an empty `Vec` if valid; otherwise a list of human-readable errors.
    fn validate(&self) -> Vec<String>;

    fn validated(self) -> Result<Self, AppError>
    where
        Self: Sized,
    {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(AppError::Validation(errors))
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_hex_color(color: &str) -> bool {
    HEX_COLOR_RE.is_match(color)
}

pub fn check_non_empty(errors: &mut Vec<String>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(format!("{field} must not be empty"));
    }
}

pub fn check_email(errors: &mut Vec<String>, email: &str) {
    if !is_valid_email(email) {
        errors.push("email must be a valid email address".to_string());
    }
}

pub fn check_color(errors: &mut Vec<String>, color: &str) {
    if !is_hex_color(color) {
        errors.push("color must be a valid hex color code (e.g. #FF0000 or #F00)".to_string());
    }
}

pub fn check_positive(errors: &mut Vec<String>, field: &str, value: i32) {
    if value <= 0 {
        errors.push(format!("{field} must be a positive integer"));
    }
}

pub fn check_password(errors: &mut Vec<String>, password: &str) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters long"
        ));
    }
}

//! Contact-detail validation shared by student and guide registration.

use std::sync::LazyLock;

use regex::Regex;
use validator::ValidateEmail;

/// Ten-digit phone number, optionally prefixed with `+91`.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+91)?[0-9]{10}$").expect("valid regex"));

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.validate_email() {
        Ok(())
    } else {
        Err(format!("Invalid email address '{email}'"))
    }
}

pub fn validate_phone(phone: &str) -> Result<(), String> {
    if PHONE_RE.is_match(phone) {
        Ok(())
    } else {
        Err(format!("Invalid phone number '{phone}'"))
    }
}

/// Lowercase and trim an email so uniqueness checks are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

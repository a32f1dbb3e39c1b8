//! Named field validators referenced from form configuration

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// Digit classes are ASCII-only; `\d` in `regex` also matches other scripts' digits
static EIN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{2}-[0-9]{7}$").unwrap());
static ZIP_CODE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{5}$").unwrap());
static PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\([0-9]{3}\)(?-u:\s)[0-9]{3}-[0-9]{4}$").unwrap());
static VIN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\S{17}$").unwrap());
static ROUTING_NUMBER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{9}$").unwrap());
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+'-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
        .unwrap()
});
static LETTERS_ONLY_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z]+$").unwrap());
static NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z]+(['\-\s][a-zA-Z]+)*\.?$").unwrap());

const PASSWORD_MESSAGE: &str = "Use 8+ characters with a mix of letters, numbers, and symbols.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidatorKey {
    Ein,
    ZipCode,
    Phone,
    Vin,
    RoutingNumber,
    Email,
    OwnershipPercentage,
    Password,
    LettersOnly,
    Name,
}

impl ValidatorKey {
    /// Check a submitted value, returning the first failure message
    pub fn check(&self, value: &str) -> Result<(), &'static str> {
        match self {
            ValidatorKey::Ein => matches(&EIN_REGEX, value, "EIN must be in the format XX-XXXXXXX (e.g., 12-3456789)"),
            ValidatorKey::ZipCode => matches(&ZIP_CODE_REGEX, value, "ZIP code must be 5 digits"),
            ValidatorKey::Phone => matches(
                &PHONE_REGEX,
                value,
                "Phone number must be in the format (XXX) XXX-XXXX",
            ),
            ValidatorKey::Vin => matches(
                &VIN_REGEX,
                value,
                "VIN must be exactly 17 characters with no spaces",
            ),
            ValidatorKey::RoutingNumber => matches(
                &ROUTING_NUMBER_REGEX,
                value,
                "Routing number must be exactly 9 digits",
            ),
            ValidatorKey::Email => matches(&EMAIL_REGEX, value, "Please enter a valid email address"),
            ValidatorKey::OwnershipPercentage => check_ownership_percentage(value),
            ValidatorKey::Password => check_password(value),
            ValidatorKey::LettersOnly => {
                matches(&LETTERS_ONLY_REGEX, value, "Must contain only letters")
            }
            ValidatorKey::Name => check_name(value),
        }
    }
}

fn matches(regex: &Regex, value: &str, message: &'static str) -> Result<(), &'static str> {
    if regex.is_match(value) {
        Ok(())
    } else {
        Err(message)
    }
}

fn check_ownership_percentage(value: &str) -> Result<(), &'static str> {
    if value.is_empty() {
        return Ok(());
    }

    // The whole remainder must be a number; "50abc" is rejected
    let cleaned = value.replacen('%', "", 1);
    match cleaned.trim().parse::<f64>() {
        Ok(percent) if (0.0..=100.0).contains(&percent) => Ok(()),
        _ => Err("Ownership percentage must be between 0 and 100"),
    }
}

// The regex crate has no lookahead, so each character class is checked separately
fn check_password(value: &str) -> Result<(), &'static str> {
    let long_enough = value.chars().count() >= 8;
    let has_letter = value.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    let has_symbol = value.chars().any(|c| !c.is_ascii_alphanumeric());

    if long_enough && has_letter && has_digit && has_symbol {
        Ok(())
    } else {
        Err(PASSWORD_MESSAGE)
    }
}

fn check_name(value: &str) -> Result<(), &'static str> {
    let length = value.chars().count();
    if length < 2 {
        return Err("Name must be at least 2 characters");
    }
    if length > 50 {
        return Err("Name must be no more than 50 characters");
    }
    if value.trim().is_empty() {
        return Err("Name cannot be just whitespace");
    }
    matches(
        &NAME_REGEX,
        value,
        "Name must contain only letters, spaces, hyphens, and apostrophes",
    )
}

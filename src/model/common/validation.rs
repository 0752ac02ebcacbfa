//! Field-level validation rules for voter records.
//!
//! Every check returns a `400 Bad Request` error carrying a message that can
//! be shown to the user as-is.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::error::{Error, Result};

use super::gender::Gender;

/// Minimum age, in whole years, to register as a voter.
pub const VOTING_AGE: u32 = 18;
pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_NAME_LENGTH: usize = 50;
pub const MAX_LONG_TEXT_LENGTH: usize = 100;
pub const MAX_EMAIL_LENGTH: usize = 254;

static VOTER_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{3}[0-9]{7}$").unwrap());
static MOBILE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[6-9][0-9]{9}$").unwrap());
static PINCODE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[1-9][0-9]{5}$").unwrap());
static AADHAR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{12}$").unwrap());
static PAN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$").unwrap());
static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

/// Upper-case and check a voter ID: three letters then seven digits.
pub fn voter_id(raw: &str) -> Result<String> {
    let voter_id = raw.trim().to_uppercase();
    if !VOTER_ID_REGEX.is_match(&voter_id) {
        return Err(Error::bad_request(
            "Voter ID must be in format: 3 letters followed by 7 digits",
        ));
    }
    Ok(voter_id)
}

pub fn password(raw: &str) -> Result<&str> {
    if raw.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(Error::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(raw)
}

/// Lower-case and check an e-mail address.
pub fn email(raw: &str) -> Result<String> {
    let email = raw.trim().to_lowercase();
    if email.len() > MAX_EMAIL_LENGTH || !EMAIL_REGEX.is_match(&email) {
        return Err(Error::bad_request(
            "Enter a valid email (e.g. user@example.com)",
        ));
    }
    Ok(email)
}

pub fn mobile(raw: &str) -> Result<String> {
    let mobile = raw.trim();
    if !MOBILE_REGEX.is_match(mobile) {
        return Err(Error::bad_request(
            "Mobile number must be 10 digits and start with 6-9",
        ));
    }
    Ok(mobile.to_string())
}

pub fn pincode(raw: &str) -> Result<String> {
    let pincode = raw.trim();
    if !PINCODE_REGEX.is_match(pincode) {
        return Err(Error::bad_request(
            "Pincode must be 6 digits starting with non-zero",
        ));
    }
    Ok(pincode.to_string())
}

/// The 12-digit national ID.
pub fn aadhar_number(raw: &str) -> Result<String> {
    let aadhar = raw.trim();
    if !AADHAR_REGEX.is_match(aadhar) {
        return Err(Error::bad_request("Aadhar number must be 12 digits"));
    }
    Ok(aadhar.to_string())
}

/// Upper-case and check a PAN: five letters, four digits, one letter.
pub fn pan_number(raw: &str) -> Result<String> {
    let pan = raw.trim().to_uppercase();
    if !PAN_REGEX.is_match(&pan) {
        return Err(Error::bad_request(
            "PAN must be in format: 5 letters, 4 digits, 1 letter",
        ));
    }
    Ok(pan)
}

pub fn gender(raw: &str) -> Result<Gender> {
    raw.parse()
        .map_err(|_| Error::bad_request("Please select a gender"))
}

/// Parse an ISO date of birth and check the voter is of voting age on `today`.
pub fn date_of_birth(raw: &str, today: NaiveDate) -> Result<NaiveDate> {
    let dob = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        Error::bad_request("Date of birth must be a valid date (YYYY-MM-DD)")
    })?;
    if dob > today {
        return Err(Error::bad_request("Date of birth cannot be in the future"));
    }
    if age_on(dob, today) < VOTING_AGE {
        return Err(Error::bad_request(format!(
            "You must be at least {VOTING_AGE} years old"
        )));
    }
    Ok(dob)
}

/// Trim a free-text field and enforce its maximum length, if any.
pub fn text(label: &str, raw: &str, max_length: Option<usize>) -> Result<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(Error::bad_request(format!("{label} cannot be empty")));
    }
    if let Some(max) = max_length {
        if value.chars().count() > max {
            return Err(Error::bad_request(format!(
                "{label} must be at most {max} characters"
            )));
        }
    }
    Ok(value.to_string())
}

/// Age in whole years on the given day.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> u32 {
    let had_birthday = (today.month(), today.day()) >= (dob.month(), dob.day());
    let years = today.year() - dob.year() - if had_birthday { 0 } else { 1 };
    years.max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn message<T: std::fmt::Debug>(result: Result<T>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn voter_id_is_normalised() {
        assert_eq!(voter_id(" abc1234567 ").unwrap(), "ABC1234567");
        assert!(voter_id("AB12345678").is_err());
        assert!(voter_id("ABC123456").is_err());
        assert!(voter_id("ABC12345678").is_err());
        assert_eq!(
            message(voter_id("1234567ABC")),
            "Voter ID must be in format: 3 letters followed by 7 digits"
        );
    }

    #[test]
    fn mobile_must_start_with_six_to_nine() {
        assert!(mobile("9876543210").is_ok());
        assert!(mobile("6000000000").is_ok());
        assert!(mobile("5876543210").is_err());
        assert!(mobile("987654321").is_err());
        assert!(mobile("98765432101").is_err());
    }

    #[test]
    fn pincode_rules() {
        assert!(pincode("560001").is_ok());
        assert!(pincode("060001").is_err());
        assert!(pincode("56001").is_err());
    }

    #[test]
    fn aadhar_rules() {
        assert!(aadhar_number("123412341234").is_ok());
        assert!(aadhar_number("12341234123").is_err());
        assert!(aadhar_number("12341234123a").is_err());
    }

    #[test]
    fn pan_is_normalised() {
        assert_eq!(pan_number("abcde1234f").unwrap(), "ABCDE1234F");
        assert!(pan_number("ABCD12345F").is_err());
        assert!(pan_number("ABCDE12345").is_err());
    }

    #[test]
    fn email_is_lowercased() {
        assert_eq!(email(" Voter@Example.COM ").unwrap(), "voter@example.com");
        assert!(email("voter@example").is_err());
        assert!(email("voter.example.com").is_err());
    }

    #[test]
    fn password_length() {
        assert!(password("abcdef").is_ok());
        assert_eq!(
            message(password("abcde")),
            "Password must be at least 6 characters"
        );
    }

    #[test]
    fn gender_codes() {
        assert_eq!(gender("F").unwrap(), Gender::Female);
        assert_eq!(message(gender("")), "Please select a gender");
    }

    #[test]
    fn date_of_birth_requires_voting_age() {
        let today = date(2024, 6, 15);
        assert_eq!(
            date_of_birth("2006-06-15", today).unwrap(),
            date(2006, 6, 15)
        );
        assert_eq!(
            message(date_of_birth("2006-06-16", today)),
            "You must be at least 18 years old"
        );
        assert!(date_of_birth("2030-01-01", today).is_err());
        assert!(date_of_birth("15/06/2000", today).is_err());
    }

    #[test]
    fn age_counts_whole_years() {
        let dob = date(2000, 2, 29);
        assert_eq!(age_on(dob, date(2018, 2, 28)), 17);
        assert_eq!(age_on(dob, date(2018, 3, 1)), 18);
        assert_eq!(age_on(dob, date(1999, 1, 1)), 0);
    }

    #[test]
    fn text_fields() {
        assert_eq!(text("City", "  Pune ", Some(50)).unwrap(), "Pune");
        assert_eq!(message(text("City", "   ", Some(50))), "City cannot be empty");
        assert_eq!(
            message(text("City", &"x".repeat(51), Some(50))),
            "City must be at most 50 characters"
        );
        assert!(text("Street address", &"x".repeat(500), None).is_ok());
    }
}

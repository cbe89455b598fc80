//! Shared form validation rules.

use std::sync::OnceLock;

use regex::Regex;

use bizdesk_core::{Money, ValidationErrors};

pub const REQUIRED: &str = "is required";

pub fn is_valid_email(value: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX
        .get_or_init(|| {
            Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
        })
        .is_match(value.trim())
}

/// Digits with optional leading `+`, spaces, dashes, dots and parentheses;
/// 7 to 15 digits in total.
pub fn is_valid_phone(value: &str) -> bool {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let shape_ok = PHONE_REGEX
        .get_or_init(|| Regex::new(r"^\+?[0-9 ()\-.]+$").expect("valid phone regex"))
        .is_match(value.trim());
    let digits = value.chars().filter(char::is_ascii_digit).count();
    shape_ok && (7..=15).contains(&digits)
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn required(errors: &mut ValidationErrors, field: &str, value: &str) {
    errors.check(is_blank(value), field, REQUIRED);
}

pub fn required_opt<T>(errors: &mut ValidationErrors, field: &str, value: &Option<T>) {
    errors.check(value.is_none(), field, REQUIRED);
}

pub fn max_len(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(field, format!("must be at most {max} characters"));
    }
}

pub fn len_between(errors: &mut ValidationErrors, field: &str, value: &str, min: usize, max: usize) {
    let len = value.trim().chars().count();
    if len < min || len > max {
        errors.add(field, format!("must be between {min} and {max} characters"));
    }
}

/// Optional email: blank is fine, anything else must look like an address.
pub fn email_opt(errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
    if let Some(v) = value.filter(|v| !is_blank(v)) {
        errors.check(!is_valid_email(v), field, "is not a valid email address");
    }
}

pub fn phone_opt(errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
    if let Some(v) = value.filter(|v| !is_blank(v)) {
        errors.check(!is_valid_phone(v), field, "is not a valid phone number");
    }
}

pub fn positive(errors: &mut ValidationErrors, field: &str, amount: Money) {
    errors.check(!amount.is_positive(), field, "must be greater than zero");
}

pub fn non_negative(errors: &mut ValidationErrors, field: &str, amount: Money) {
    errors.check(amount.is_negative(), field, "must not be negative");
}

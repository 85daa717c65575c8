//! Field validation for extracted contact records
//!
//! Only a non-integer age makes a record invalid. Implausible values
//! produce warnings.

use super::models::{AgeValue, ContactRecord};
use serde::Serialize;

const MIN_AGE: i64 = 0;
const MAX_AGE: i64 = 150;
const MIN_PHONE_DIGITS: usize = 10;

/// Outcome of validating a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub extracted_count: usize,
}

pub fn validate(record: &ContactRecord) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    match &record.age {
        Some(AgeValue::Integer(age)) if !(MIN_AGE..=MAX_AGE).contains(age) => {
            warnings.push("Age seems unrealistic".to_string());
        }
        Some(AgeValue::Other(_)) => errors.push("Age must be integer".to_string()),
        _ => {}
    }

    if let Some(email) = record.email.as_deref().filter(|e| !e.is_empty()) {
        if !email.contains('@') {
            warnings.push("Email format seems invalid".to_string());
        }
    }

    if let Some(phone) = record.phone.as_deref().filter(|p| !p.is_empty()) {
        if !is_plausible_phone(phone) {
            warnings.push("Phone format seems invalid".to_string());
        }
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        extracted_count: record.extracted_count(),
    }
}

/// Strip spaces, dashes and parentheses; the rest must be 10+ digits
fn is_plausible_phone(phone: &str) -> bool {
    let digits: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && digits.len() >= MIN_PHONE_DIGITS
}

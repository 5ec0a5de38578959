//! Input normalization helpers for identity fields.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::CoreError;

/// Normalize a South African mobile number to E.164 (`+27...`).
///
/// Accepts `0XXXXXXXXX`, `27XXXXXXXXX`, or `+27XXXXXXXXX` with optional
/// spaces or dashes.
pub fn normalize_phone(raw: &str) -> Result<String, CoreError> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^(?:\+?27|0)([1-9]\d{8})$").expect("phone pattern is valid")
    });

    let cleaned: String = raw.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    let captures = pattern.captures(&cleaned).ok_or_else(|| {
        CoreError::Validation(format!("Invalid South African phone number: {raw}"))
    })?;
    Ok(format!("+27{}", &captures[1]))
}

/// Shape check for a South African ID number: 13 digits opening with a
/// plausible YYMMDD birth date. Failures reject the evidence rather than the
/// request shape, so callers can distinguish a malformed body from a
/// document that cannot be adjudicated.
pub fn validate_id_number(id: &str) -> Result<(), CoreError> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^\d{2}(0[1-9]|1[0-2])(0[1-9]|[12]\d|3[01])\d{7}$")
            .expect("id number pattern is valid")
    });
    if !pattern.is_match(id) {
        return Err(CoreError::EvidenceRejected(
            "ID number must be 13 digits starting with a YYMMDD birth date".into(),
        ));
    }
    Ok(())
}

/// Lightweight email shape check. Full deliverability is proven by the
/// verification token flow, not by parsing.
pub fn validate_email(email: &str) -> Result<(), CoreError> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    });
    if !pattern.is_match(email) {
        return Err(CoreError::Validation(format!("Invalid email: {email}")));
    }
    Ok(())
}

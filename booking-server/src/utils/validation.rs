//! Input validation helpers
//!
//! Centralized text length constants and validation functions.

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: venue, table, room, room type
pub const MAX_NAME_LEN: usize = 200;

/// Notes, descriptions, reasons (cancel reason, coupon description)
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: coupon codes, currency, payment method, transaction ids
pub const MAX_SHORT_TEXT_LEN: usize = 100;

// ── Booking size limits ─────────────────────────────────────────────

/// Guests on a single booking
pub const MAX_GUESTS: i32 = 10_000;

/// Tables, rooms or hall sections on a single booking
pub const MAX_UNITS_PER_BOOKING: i32 = 100;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Validate a money amount: finite and not negative.
pub fn validate_amount(value: f64, field: &str) -> Result<(), AppError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::validation(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(())
}

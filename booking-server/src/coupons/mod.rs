//! Coupons
//!
//! Coupon definitions are created by admins and resolved at booking time.

mod resolver;

pub use resolver::{CouponResolver, CouponSource};

use shared::models::{Coupon, CouponCreate, CouponKind, normalize_coupon_code};
use shared::util::now_millis;
use thiserror::Error;

use crate::storage::{BookingStorage, StorageError};
use crate::utils::validation::{MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text, validate_required_text};
use crate::utils::{AppError, ErrorCode};

#[derive(Debug, Error)]
pub enum CouponError {
    #[error("Coupon not found: {0}")]
    NotFound(String),

    #[error("Coupon has expired: {0}")]
    Expired(String),

    #[error("Coupon is no longer active: {0}")]
    Inactive(String),

    #[error("{0}")]
    InvalidValue(String),

    #[error("Coupon code already exists: {0}")]
    Exists(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<CouponError> for AppError {
    fn from(err: CouponError) -> Self {
        match err {
            CouponError::NotFound(code) => {
                AppError::new(ErrorCode::CouponNotFound).with_detail("code", code)
            }
            CouponError::Expired(code) => {
                AppError::new(ErrorCode::CouponExpired).with_detail("code", code)
            }
            CouponError::Inactive(code) => {
                AppError::new(ErrorCode::CouponInactive).with_detail("code", code)
            }
            CouponError::InvalidValue(msg) => {
                AppError::with_message(ErrorCode::CouponInvalidValue, msg)
            }
            CouponError::Exists(code) => {
                AppError::new(ErrorCode::CouponCodeExists).with_detail("code", code)
            }
            CouponError::Storage(StorageError::CouponExists(code)) => {
                AppError::new(ErrorCode::CouponCodeExists).with_detail("code", code)
            }
            CouponError::Storage(e) => {
                tracing::error!(error = %e, "Coupon storage error");
                AppError::database(e.to_string())
            }
        }
    }
}

/// Admin-facing coupon operations
#[derive(Clone)]
pub struct CouponService {
    storage: BookingStorage,
}

impl CouponService {
    pub fn new(storage: BookingStorage) -> Self {
        Self { storage }
    }

    pub fn create(&self, payload: CouponCreate) -> Result<Coupon, AppError> {
        validate_required_text(&payload.code, "code", MAX_SHORT_TEXT_LEN)?;
        validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

        let valid_value = payload.value.is_finite()
            && payload.value > 0.0
            && (payload.kind == CouponKind::Flat || payload.value <= 100.0);
        if !valid_value {
            return Err(CouponError::InvalidValue(format!(
                "Invalid {:?} coupon value: {}",
                payload.kind, payload.value
            ))
            .into());
        }

        let now = now_millis();
        if payload.expires_at <= now {
            return Err(AppError::validation("expires_at must be in the future"));
        }

        let coupon = Coupon {
            code: normalize_coupon_code(&payload.code),
            kind: payload.kind,
            value: payload.value,
            is_active: payload.is_active.unwrap_or(true),
            expires_at: payload.expires_at,
            description: payload.description,
            created_at: now,
        };

        self.storage
            .insert_coupon(&coupon)
            .map_err(CouponError::from)?;
        tracing::info!(coupon = %coupon.code, kind = ?coupon.kind, "Coupon created");
        Ok(coupon)
    }

    pub fn get(&self, code: &str) -> Result<Coupon, AppError> {
        let code = normalize_coupon_code(code);
        self.storage
            .get_coupon(&code)
            .map_err(CouponError::from)?
            .ok_or_else(|| CouponError::NotFound(code).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(code: &str, kind: CouponKind, value: f64) -> CouponCreate {
        CouponCreate {
            code: code.into(),
            kind,
            value,
            expires_at: now_millis() + 86_400_000,
            description: Some("spring promo".into()),
            is_active: None,
        }
    }

    #[test]
    fn test_create_normalizes_and_rejects_duplicates() {
        let service = CouponService::new(BookingStorage::open_in_memory().unwrap());
        let coupon = service
            .create(payload("spring15", CouponKind::Percentage, 15.0))
            .unwrap();
        assert_eq!(coupon.code, "SPRING15");
        assert!(coupon.is_active);

        let err = service
            .create(payload("Spring15", CouponKind::Percentage, 10.0))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CouponCodeExists);

        assert_eq!(service.get("spring15").unwrap().value, 15.0);
        assert_eq!(service.get("nope").unwrap_err().code, ErrorCode::CouponNotFound);
    }

    #[test]
    fn test_create_validates_value() {
        let service = CouponService::new(BookingStorage::open_in_memory().unwrap());
        let err = service
            .create(payload("P", CouponKind::Percentage, 120.0))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CouponInvalidValue);
        assert!(service.create(payload("F", CouponKind::Flat, 120.0)).is_ok());
        assert!(service.create(payload("Z", CouponKind::Flat, 0.0)).is_err());
    }

    #[test]
    fn test_error_mapping() {
        let err: AppError = CouponError::Expired("OLD".into()).into();
        assert_eq!(err.code, ErrorCode::CouponExpired);
        assert_eq!(err.http_status(), http::StatusCode::BAD_REQUEST);
    }
}

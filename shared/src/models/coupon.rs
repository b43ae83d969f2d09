//! Coupon Model

use serde::{Deserialize, Serialize};

/// Coupon discount type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    Percentage,
    Flat,
}

/// Coupon entity (优惠券)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Coupon {
    /// Stored upper-case
    pub code: String,
    pub kind: CouponKind,
    /// Percentage (15 = 15%) or flat amount
    pub value: f64,
    pub is_active: bool,
    /// Expiry (Unix millis)
    pub expires_at: i64,
    pub description: Option<String>,
    pub created_at: i64,
}

impl Coupon {
    /// Usable only while active and not past expiry
    pub fn is_usable_at(&self, now_millis: i64) -> bool {
        self.is_active && self.expires_at >= now_millis
    }
}

/// Normalize a coupon code for storage and lookup
pub fn normalize_coupon_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Create coupon payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponCreate {
    pub code: String,
    pub kind: CouponKind,
    pub value: f64,
    pub expires_at: i64,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

//! Pricing Module
//!
//! Turns a venue's rate card, a booking window and an optional coupon into
//! an immutable [`shared::models::PricingBreakdown`].
//! Uses rust_decimal for precise calculations, stores as f64.

mod calculator;
mod engine;
pub mod policy;

pub use calculator::{MONEY_TOLERANCE, RawBreakdown, money_eq, to_decimal, to_f64};
pub use engine::{PricingEngine, PricingInput};
pub use policy::{AppliedCoupon, CouponDiscount};

use shared::models::VenueKind;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    #[error("{kind} booking of {actual} {unit} exceeds the maximum of {max}")]
    DurationOutOfRange {
        kind: VenueKind,
        actual: i64,
        max: i64,
        unit: &'static str,
    },

    #[error("{0}")]
    GuestsOutOfRange(String),

    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(i32),

    #[error("unit rate must be non-negative, got {0}")]
    InvalidRate(f64),
}

//! Pricing Breakdown Model
//!
//! Immutable snapshot persisted with each booking. Money is stored as f64
//! already rounded to 2 decimal places; computation happens in Decimal.

use serde::{Deserialize, Serialize};

/// Where a discount line came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscountSource {
    /// Promotional rule built into the vertical (duration, quantity, party size...)
    System,
    Coupon,
}

/// Adjustment type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Percentage,
    Flat,
}

/// Applied surcharge multiplier (weekend / peak)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MultiplierLine {
    pub label: String,
    pub factor: f64,
}

/// Applied discount
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscountLine {
    pub source: DiscountSource,
    pub kind: DiscountKind,
    pub label: String,
    /// Percentage (10 = 10%) or flat value as configured
    pub value: f64,
    /// Amount actually deducted
    pub amount: f64,
}

/// Fixed fee line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeeLine {
    pub label: String,
    pub amount: f64,
}

/// Computed price breakdown (价格明细)
///
/// `total = subtotal_after_discount + tax_amount + fee_total`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingBreakdown {
    pub unit_rate: f64,
    /// Billable units (nights × rooms, hours × tables, guests, days × sections)
    ///
    /// Fractional only for cafes booked in part-hours.
    pub quantity: f64,
    pub base_subtotal: f64,
    #[serde(default)]
    pub multipliers: Vec<MultiplierLine>,
    pub adjusted_subtotal: f64,
    #[serde(default)]
    pub discounts: Vec<DiscountLine>,
    pub discount_total: f64,
    pub subtotal_after_discount: f64,
    pub tax_percentage: f64,
    pub tax_amount: f64,
    #[serde(default)]
    pub fees: Vec<FeeLine>,
    pub fee_total: f64,
    pub total: f64,
    pub currency: String,
}

//! Money calculation utilities using rust_decimal for precision
//!
//! All calculations are done using `Decimal` internally, then converted to `f64`
//! (rounded to 2 places, half away from zero) for the persisted snapshot.

use rust_decimal::prelude::*;
use shared::models::{DiscountKind, DiscountLine, DiscountSource, FeeLine, MultiplierLine, PricingBreakdown};

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Compare two stored amounts within [`MONEY_TOLERANCE`]
pub fn money_eq(a: f64, b: f64) -> bool {
    (to_decimal(a) - to_decimal(b)).abs() <= MONEY_TOLERANCE
}

/// Discount line at full precision
#[derive(Debug, Clone, PartialEq)]
pub struct RawDiscount {
    pub source: DiscountSource,
    pub kind: DiscountKind,
    pub label: String,
    pub value: Decimal,
    pub amount: Decimal,
}

/// Breakdown at full precision; rounded only by [`RawBreakdown::into_snapshot`]
#[derive(Debug, Clone)]
pub struct RawBreakdown {
    pub unit_rate: Decimal,
    pub quantity: Decimal,
    pub base_subtotal: Decimal,
    pub multipliers: Vec<(String, Decimal)>,
    pub adjusted_subtotal: Decimal,
    pub discounts: Vec<RawDiscount>,
    pub discount_total: Decimal,
    pub subtotal_after_discount: Decimal,
    pub tax_percentage: Decimal,
    pub tax_amount: Decimal,
    pub fees: Vec<(String, Decimal)>,
    pub fee_total: Decimal,
    pub total: Decimal,
    pub currency: String,
}

impl RawBreakdown {
    pub fn into_snapshot(self) -> PricingBreakdown {
        PricingBreakdown {
            unit_rate: to_f64(self.unit_rate),
            quantity: to_f64(self.quantity),
            base_subtotal: to_f64(self.base_subtotal),
            multipliers: self
                .multipliers
                .into_iter()
                .map(|(label, factor)| MultiplierLine {
                    label,
                    factor: to_f64(factor),
                })
                .collect(),
            adjusted_subtotal: to_f64(self.adjusted_subtotal),
            discounts: self
                .discounts
                .into_iter()
                .map(|d| DiscountLine {
                    source: d.source,
                    kind: d.kind,
                    label: d.label,
                    value: to_f64(d.value),
                    amount: to_f64(d.amount),
                })
                .collect(),
            discount_total: to_f64(self.discount_total),
            subtotal_after_discount: to_f64(self.subtotal_after_discount),
            tax_percentage: to_f64(self.tax_percentage),
            tax_amount: to_f64(self.tax_amount),
            fees: self
                .fees
                .into_iter()
                .map(|(label, amount)| FeeLine {
                    label,
                    amount: to_f64(amount),
                })
                .collect(),
            fee_total: to_f64(self.fee_total),
            total: to_f64(self.total),
            currency: self.currency,
        }
    }
}

//! Discount policies
//!
//! Each vertical pairs a set of system promotions with a composition rule
//! deciding how they combine with each other and with a coupon.
//!
//! | Vertical | System promotions combine | Coupon |
//! |----------|---------------------------|--------|
//! | Hotel | summed | percentage stacks onto the system %, flat subtracts after |
//! | Restaurant | best one wins | percentage stacks onto the system %, flat subtracts after |
//! | Hall | summed | applied to what remains after system discounts |
//! | Cafe | best one wins | replaces system promotions entirely |

use rust_decimal::prelude::*;
use shared::models::{DiscountKind, DiscountSource, VenueKind};

use super::calculator::RawDiscount;

/// Validated coupon discount, ready to apply
#[derive(Debug, Clone, PartialEq)]
pub enum CouponDiscount {
    /// Percent of the adjusted subtotal, 0 < p <= 100
    Percentage(Decimal),
    /// Fixed amount, already capped at the amount it was resolved against
    Flat(Decimal),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppliedCoupon {
    pub code: String,
    pub discount: CouponDiscount,
}

/// How system promotions and a coupon combine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composition {
    SumThenStack,
    MaxThenStack,
    SumThenCouponOnRemainder,
    CouponReplacesSystem,
}

impl Composition {
    pub fn for_kind(kind: VenueKind) -> Self {
        match kind {
            VenueKind::Hotel => Self::SumThenStack,
            VenueKind::Restaurant => Self::MaxThenStack,
            VenueKind::Hall => Self::SumThenCouponOnRemainder,
            VenueKind::Cafe => Self::CouponReplacesSystem,
        }
    }

    fn sums_system(&self) -> bool {
        matches!(self, Self::SumThenStack | Self::SumThenCouponOnRemainder)
    }
}

/// Inputs the system promotions look at
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscountFacts {
    /// Nights (hotel) or inclusive days (hall)
    pub days: i64,
    /// Rooms, tables or sections
    pub units: i32,
    pub guests: i32,
    pub hours: Decimal,
    pub first_booking_of_day: bool,
}

/// A system promotion that applies to this booking
#[derive(Debug, Clone, PartialEq)]
pub struct SystemRule {
    pub label: &'static str,
    pub percent: Decimal,
}

fn rule(label: &'static str, percent: i64) -> SystemRule {
    SystemRule {
        label,
        percent: Decimal::from(percent),
    }
}

/// System promotions whose thresholds the booking meets
pub fn system_rules(kind: VenueKind, facts: &DiscountFacts) -> Vec<SystemRule> {
    let mut rules = Vec::new();
    match kind {
        VenueKind::Hotel => {
            if facts.days >= 3 {
                rules.push(rule("Long stay (3+ nights)", 10));
            }
            if facts.units > 2 {
                rules.push(rule("Multiple rooms (3+)", 5));
            }
        }
        VenueKind::Hall => {
            if facts.days >= 3 {
                rules.push(rule("Multi-day event (3+ days)", 10));
            }
            if facts.units > 2 {
                rules.push(rule("Multiple sections (3+)", 5));
            }
        }
        VenueKind::Restaurant => {
            if facts.first_booking_of_day {
                rules.push(rule("First booking of the day", 15));
            }
            if facts.guests >= 6 {
                rules.push(rule("Large party (6+ guests)", 20));
            }
        }
        VenueKind::Cafe => {
            if facts.hours >= Decimal::from(3) {
                rules.push(rule("Extended stay (3+ hours)", 10));
            }
            if facts.units > 2 {
                rules.push(rule("Multiple tables (3+)", 5));
            }
        }
    }
    rules
}

/// Keep the best rule when promotions do not combine
fn best_rule(rules: Vec<SystemRule>) -> Vec<SystemRule> {
    rules
        .into_iter()
        .fold(None::<SystemRule>, |best, r| match best {
            Some(b) if b.percent >= r.percent => Some(b),
            _ => Some(r),
        })
        .into_iter()
        .collect()
}

fn percent_line(
    source: DiscountSource,
    label: String,
    percent: Decimal,
    base: Decimal,
) -> RawDiscount {
    RawDiscount {
        source,
        kind: DiscountKind::Percentage,
        label,
        value: percent,
        amount: base * percent / Decimal::ONE_HUNDRED,
    }
}

/// Compose system promotions and an optional coupon into discount lines
///
/// Percentages never exceed 100 in total and the summed line amounts never
/// exceed `adjusted`.
pub fn compose(
    kind: VenueKind,
    adjusted: Decimal,
    facts: &DiscountFacts,
    coupon: Option<&AppliedCoupon>,
) -> Vec<RawDiscount> {
    let composition = Composition::for_kind(kind);
    let hundred = Decimal::ONE_HUNDRED;
    let coupon_label = |c: &AppliedCoupon| format!("Coupon {}", c.code);

    if composition == Composition::CouponReplacesSystem
        && let Some(c) = coupon
    {
        let line = match &c.discount {
            CouponDiscount::Percentage(p) => {
                percent_line(DiscountSource::Coupon, coupon_label(c), (*p).min(hundred), adjusted)
            }
            CouponDiscount::Flat(f) => flat_line(coupon_label(c), *f, adjusted),
        };
        return vec![line];
    }

    let applicable = system_rules(kind, facts);
    let rules = if composition.sums_system() {
        applicable
    } else {
        best_rule(applicable)
    };

    let mut lines = Vec::new();
    let mut used_percent = Decimal::ZERO;
    for r in rules {
        let percent = r.percent.min(hundred - used_percent);
        if percent <= Decimal::ZERO {
            break;
        }
        used_percent += percent;
        lines.push(percent_line(
            DiscountSource::System,
            r.label.to_string(),
            percent,
            adjusted,
        ));
    }

    let Some(c) = coupon else {
        return lines;
    };

    let system_total: Decimal = lines.iter().map(|l| l.amount).sum();
    let remaining = (adjusted - system_total).max(Decimal::ZERO);

    let line = match (&c.discount, composition) {
        (CouponDiscount::Percentage(p), Composition::SumThenCouponOnRemainder) => {
            percent_line(DiscountSource::Coupon, coupon_label(c), (*p).min(hundred), remaining)
        }
        (CouponDiscount::Percentage(p), _) => {
            let percent = (*p).min(hundred - used_percent).max(Decimal::ZERO);
            percent_line(DiscountSource::Coupon, coupon_label(c), percent, adjusted)
        }
        (CouponDiscount::Flat(f), _) => flat_line(coupon_label(c), *f, remaining),
    };
    lines.push(line);
    lines
}

fn flat_line(label: String, value: Decimal, available: Decimal) -> RawDiscount {
    RawDiscount {
        source: DiscountSource::Coupon,
        kind: DiscountKind::Flat,
        label,
        value,
        amount: value.min(available).max(Decimal::ZERO),
    }
}

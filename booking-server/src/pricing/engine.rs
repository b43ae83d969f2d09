//! Pricing Engine
//!
//! Pure computation: no I/O, no clock. The caller supplies the venue's rate
//! card and fees, the resolved window, an already validated coupon and
//! whether this would be the venue's first booking of the day.

use chrono::NaiveTime;
use rust_decimal::prelude::*;
use shared::models::{FeeSchedule, PricingBreakdown, RateCard, VenueKind};

use super::PricingError;
use super::calculator::{RawBreakdown, to_decimal};
use super::policy::{AppliedCoupon, DiscountFacts, compose};
use crate::utils::time::is_weekend;
use crate::window::ResolvedWindow;

/// Weekend surcharge factor (+10%)
const WEEKEND_FACTOR: Decimal = Decimal::from_parts(110, 0, 0, false, 2);
/// Peak-hour surcharge factor (+15%)
const PEAK_FACTOR: Decimal = Decimal::from_parts(115, 0, 0, false, 2);

const MAX_RESTAURANT_MINUTES: i64 = 8 * 60;
const MAX_CAFE_MINUTES: i64 = 12 * 60;
const MAX_HOTEL_NIGHTS: i64 = 30;
const MAX_HALL_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy)]
pub struct PricingInput<'a> {
    pub kind: VenueKind,
    pub rates: &'a RateCard,
    pub fees: &'a FeeSchedule,
    pub currency: &'a str,
    pub window: &'a ResolvedWindow,
    pub guests: i32,
    /// Rooms, tables or hall sections
    pub quantity: i32,
    pub first_booking_of_day: bool,
}

#[derive(Debug, Clone)]
pub struct PricingEngine {
    peak_start: NaiveTime,
}

impl PricingEngine {
    pub fn new(peak_start: NaiveTime) -> Self {
        Self { peak_start }
    }

    /// Billable units for the window, enforcing per-vertical duration caps
    pub fn billable_quantity(&self, input: &PricingInput<'_>) -> Result<Decimal, PricingError> {
        if input.guests < 1 {
            return Err(PricingError::GuestsOutOfRange(
                "guests must be at least 1".into(),
            ));
        }
        if input.quantity < 1 {
            return Err(PricingError::InvalidQuantity(input.quantity));
        }

        let window = input.window;
        match input.kind {
            VenueKind::Restaurant => {
                check_cap(window.minutes(), MAX_RESTAURANT_MINUTES, "minutes", input.kind)?;
                Ok(Decimal::from(input.guests))
            }
            VenueKind::Cafe => {
                check_cap(window.minutes(), MAX_CAFE_MINUTES, "minutes", input.kind)?;
                Ok(hours(window) * Decimal::from(input.quantity))
            }
            VenueKind::Hotel => {
                check_cap(window.day_count(), MAX_HOTEL_NIGHTS, "nights", input.kind)?;
                Ok(Decimal::from(window.day_count()) * Decimal::from(input.quantity))
            }
            VenueKind::Hall => {
                check_cap(window.day_count(), MAX_HALL_DAYS, "days", input.kind)?;
                Ok(Decimal::from(window.day_count()) * Decimal::from(input.quantity))
            }
        }
    }

    /// Surcharges that apply to the window
    pub fn multipliers(&self, kind: VenueKind, window: &ResolvedWindow) -> Vec<(String, Decimal)> {
        let mut factors = Vec::new();
        if is_weekend(window.first_date()) {
            factors.push(("Weekend".to_string(), WEEKEND_FACTOR));
        }
        if kind.is_slot_based()
            && let Some(end) = window.end_time()
            && end >= self.peak_start
        {
            factors.push(("Peak hours".to_string(), PEAK_FACTOR));
        }
        factors
    }

    /// Subtotal after surcharges; the amount coupons are resolved against
    pub fn adjusted_subtotal(&self, input: &PricingInput<'_>) -> Result<Decimal, PricingError> {
        let quantity = self.billable_quantity(input)?;
        let base = to_decimal(input.rates.unit_rate) * quantity;
        Ok(self
            .multipliers(input.kind, input.window)
            .iter()
            .fold(base, |acc, (_, factor)| acc * factor))
    }

    /// Full breakdown, rounded for persistence
    pub fn quote(
        &self,
        input: &PricingInput<'_>,
        coupon: Option<&AppliedCoupon>,
    ) -> Result<PricingBreakdown, PricingError> {
        Ok(self.quote_raw(input, coupon)?.into_snapshot())
    }

    pub fn quote_raw(
        &self,
        input: &PricingInput<'_>,
        coupon: Option<&AppliedCoupon>,
    ) -> Result<RawBreakdown, PricingError> {
        let rate = to_decimal(input.rates.unit_rate);
        if rate.is_sign_negative() {
            return Err(PricingError::InvalidRate(input.rates.unit_rate));
        }

        let quantity = self.billable_quantity(input)?;
        let base_subtotal = rate * quantity;
        let multipliers = self.multipliers(input.kind, input.window);
        let adjusted_subtotal = multipliers
            .iter()
            .fold(base_subtotal, |acc, (_, factor)| acc * factor);

        let facts = DiscountFacts {
            days: input.window.day_count(),
            units: input.quantity,
            guests: input.guests,
            hours: hours(input.window),
            first_booking_of_day: input.first_booking_of_day,
        };
        let discounts = compose(input.kind, adjusted_subtotal, &facts, coupon);
        let discount_total = discounts
            .iter()
            .map(|d| d.amount)
            .sum::<Decimal>()
            .min(adjusted_subtotal);
        let subtotal_after_discount = adjusted_subtotal - discount_total;

        let tax_percentage = to_decimal(input.fees.tax_percentage);
        let tax_amount = subtotal_after_discount * tax_percentage / Decimal::ONE_HUNDRED;

        let fees: Vec<(String, Decimal)> = [
            ("Service fee", input.fees.service_fee),
            ("Reservation fee", input.fees.reservation_fee),
            ("Platform fee", input.fees.platform_fee),
        ]
        .into_iter()
        .map(|(label, amount)| (label.to_string(), to_decimal(amount)))
        .filter(|(_, amount)| !amount.is_zero())
        .collect();
        let fee_total: Decimal = fees.iter().map(|(_, amount)| *amount).sum();

        let total = subtotal_after_discount + tax_amount + fee_total;

        Ok(RawBreakdown {
            unit_rate: rate,
            quantity,
            base_subtotal,
            multipliers,
            adjusted_subtotal,
            discounts,
            discount_total,
            subtotal_after_discount,
            tax_percentage,
            tax_amount,
            fees,
            fee_total,
            total,
            currency: input.currency.to_string(),
        })
    }
}

fn hours(window: &ResolvedWindow) -> Decimal {
    Decimal::from(window.minutes()) / Decimal::from(60)
}

fn check_cap(actual: i64, max: i64, unit: &'static str, kind: VenueKind) -> Result<(), PricingError> {
    if actual > max {
        return Err(PricingError::DurationOutOfRange {
            kind,
            actual,
            max,
            unit,
        });
    }
    Ok(())
}

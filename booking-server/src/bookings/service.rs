//! Booking orchestration
//!
//! Every mutation runs inside one redb write transaction: load venue and
//! bookings, check, claim or release, persist, commit. Side effects that
//! must not roll anything back (timers, cache, notifications) happen only
//! after the commit.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use redb::WriteTransaction;
use shared::models::{
    AvailabilityReport, Booking, BookingCreated, BookingRequest, BookingStatus,
    BookingStatusUpdate, MyBookings, NotificationKind, Payment, PaymentConfirm, PaymentStatus,
    PricingBreakdown, Venue, VenueKind,
};
use shared::util::{now_millis, snowflake_id};

use super::error::BookingError;
use super::expiry::ExpiryScheduler;
use super::state_machine::{BookingAction, next_status};
use crate::auth::CurrentUser;
use crate::availability::{
    ClaimRequest, LocalNow, check_party_size, claim, list_available_slots, release,
};
use crate::coupons::CouponResolver;
use crate::pricing::{AppliedCoupon, PricingEngine, PricingInput};
use crate::security_log;
use crate::services::NotificationDispatcher;
use crate::storage::{BookingStorage, StorageError};
use crate::utils::validation::MAX_NOTE_LEN;
use crate::venues::VenueService;
use crate::window::ResolvedWindow;

type Result<T> = std::result::Result<T, BookingError>;

/// Lifecycle settings taken from [`Config`](crate::core::Config)
#[derive(Debug, Clone, Copy)]
pub struct BookingSettings {
    pub business_tz: Tz,
    pub payment_timeout: Duration,
}

/// Validated request, priced against the cached venue
struct Prepared {
    window: ResolvedWindow,
    guests: i32,
    quantity: i32,
    coupon: Option<AppliedCoupon>,
}

/// Extra data carried by a transition
#[derive(Debug, Default)]
struct TransitionNote {
    reason: Option<String>,
    payment: Option<PaymentConfirm>,
}

#[derive(Clone)]
pub struct BookingService {
    storage: BookingStorage,
    venues: VenueService,
    coupons: CouponResolver,
    engine: PricingEngine,
    expiry: Arc<ExpiryScheduler>,
    notifier: NotificationDispatcher,
    settings: BookingSettings,
}

impl BookingService {
    pub fn new(
        storage: BookingStorage,
        venues: VenueService,
        engine: PricingEngine,
        expiry: Arc<ExpiryScheduler>,
        notifier: NotificationDispatcher,
        settings: BookingSettings,
    ) -> Self {
        Self {
            coupons: CouponResolver::new(Arc::new(storage.clone())),
            storage,
            venues,
            engine,
            expiry,
            notifier,
            settings,
        }
    }

    pub fn expiry(&self) -> &Arc<ExpiryScheduler> {
        &self.expiry
    }

    // ========== Pricing & Creation ==========

    /// Price a request without claiming or persisting anything
    pub fn preview(
        &self,
        kind: VenueKind,
        venue_id: i64,
        req: &BookingRequest,
    ) -> Result<PricingBreakdown> {
        let venue = self.cached_venue(kind, venue_id)?;
        let prepared = self.prepare(&venue, req)?;
        let existing = self.storage.bookings_for_venue(venue_id)?;
        let first = is_first_booking_of_day(&existing, prepared.window.first_date());
        Ok(self
            .engine
            .quote(&pricing_input(&venue, &prepared, first), prepared.coupon.as_ref())?)
    }

    /// Price, claim and persist a booking in one transaction
    pub fn create(
        &self,
        kind: VenueKind,
        venue_id: i64,
        req: BookingRequest,
        actor: &CurrentUser,
    ) -> Result<BookingCreated> {
        let cached = self.cached_venue(kind, venue_id)?;
        let prepared = self.prepare(&cached, &req)?;

        let transaction_id = req
            .payment
            .as_ref()
            .and_then(|p| p.transaction_id.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let method = req.payment.as_ref().and_then(|p| p.method.clone());

        let booking = self.write(|txn| {
            let mut venue = self
                .storage
                .get_venue_txn(txn, venue_id)?
                .ok_or(BookingError::VenueNotFound(venue_id))?;
            ensure_bookable(kind, &venue)?;
            let existing = self.storage.bookings_for_venue_txn(txn, venue_id)?;

            let first = is_first_booking_of_day(&existing, prepared.window.first_date());
            let breakdown = self
                .engine
                .quote(&pricing_input(&venue, &prepared, first), prepared.coupon.as_ref())?;

            let booking_id = snowflake_id();
            let units = claim(
                &mut venue,
                &existing,
                &ClaimRequest {
                    booking_id,
                    window: &prepared.window,
                    guests: prepared.guests,
                    quantity: prepared.quantity,
                    table_id: req.table_id,
                    room_id: req.room_id,
                    room_type: req.room_type.as_deref(),
                },
            )?;

            let now = now_millis();
            let (status, payment, expires_at) = match &transaction_id {
                Some(tx_id) => (
                    if kind.is_slot_based() {
                        BookingStatus::Upcoming
                    } else {
                        BookingStatus::Confirmed
                    },
                    Payment {
                        status: PaymentStatus::Paid,
                        method: method.clone(),
                        transaction_id: Some(tx_id.clone()),
                        paid_amount: breakdown.total,
                        paid_at: Some(now),
                        updated_at: now,
                    },
                    None,
                ),
                None => (
                    BookingStatus::Pending,
                    Payment {
                        status: PaymentStatus::Pending,
                        method: method.clone(),
                        transaction_id: None,
                        paid_amount: 0.0,
                        paid_at: None,
                        updated_at: now,
                    },
                    Some(now + self.settings.payment_timeout.as_millis() as i64),
                ),
            };

            let booking = Booking {
                id: booking_id,
                kind,
                venue_id,
                owner_id: venue.owner_id.clone(),
                user_id: actor.id.clone(),
                sub_resource_ids: units.clone(),
                window: prepared.window.to_stored(),
                guests: prepared.guests,
                quantity: prepared.quantity,
                status,
                breakdown,
                coupon_code: prepared.coupon.as_ref().map(|c| c.code.clone()),
                payment,
                checked_in_at: None,
                checked_out_at: None,
                cancelled_by: None,
                cancel_reason: None,
                expires_at,
                created_at: now,
                updated_at: now,
            };

            if !units.is_empty() {
                venue.updated_at = now;
                self.storage.put_venue(txn, &venue)?;
            }
            self.storage.put_booking(txn, &booking)?;
            if let Some(due_at) = expires_at {
                self.storage.put_expiration(txn, booking.id, due_at)?;
            }
            Ok(booking)
        })?;

        if let Some(due_at) = booking.expires_at {
            self.expiry.schedule(booking.id, due_at);
        }
        self.venues.invalidate(venue_id);

        tracing::info!(
            booking_id = booking.id,
            kind = %kind,
            venue_id,
            user_id = %booking.user_id,
            status = %booking.status,
            units = ?booking.sub_resource_ids,
            total = booking.breakdown.total,
            "Booking created"
        );
        self.notifier
            .booking_event(NotificationKind::BookingCreated, &booking);

        Ok(BookingCreated {
            breakdown: booking.breakdown.clone(),
            booking,
        })
    }

    // ========== Reads ==========

    pub fn get(&self, booking_id: i64, actor: &CurrentUser) -> Result<Booking> {
        let booking = self
            .storage
            .get_booking(booking_id)?
            .ok_or(BookingError::NotFound(booking_id))?;
        let party = booking.user_id == actor.id || booking.owner_id == actor.id;
        if !(party || actor.is_admin()) {
            return Err(deny(actor, &booking, "view"));
        }
        Ok(booking)
    }

    /// The caller's bookings across all verticals, newest first
    pub fn my_bookings(&self, actor: &CurrentUser) -> Result<MyBookings> {
        let mut bookings = self.storage.bookings_for_user(&actor.id)?;
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut mine = MyBookings::default();
        for booking in bookings {
            mine.push(booking);
        }
        Ok(mine)
    }

    /// Free capacity for `date`, read straight from storage
    pub fn availability(
        &self,
        kind: VenueKind,
        venue_id: i64,
        date: NaiveDate,
        party_size: Option<i32>,
    ) -> Result<AvailabilityReport> {
        let venue = self
            .storage
            .get_venue(venue_id)?
            .ok_or(BookingError::VenueNotFound(venue_id))?;
        ensure_kind(kind, &venue)?;
        let bookings = self.storage.bookings_for_venue(venue_id)?;

        let slots = if venue.is_active {
            list_available_slots(&venue, &bookings, date, party_size, self.local_now())
        } else {
            Vec::new()
        };
        Ok(AvailabilityReport {
            venue_id,
            kind,
            date: date.format("%Y-%m-%d").to_string(),
            party_size,
            slots,
        })
    }

    // ========== Transitions ==========

    pub fn cancel(
        &self,
        booking_id: i64,
        actor: &CurrentUser,
        reason: Option<String>,
    ) -> Result<Booking> {
        let reason = clean_reason(reason)?;
        self.transition(
            booking_id,
            Some(actor),
            BookingAction::Cancel,
            TransitionNote {
                reason,
                payment: None,
            },
        )
    }

    pub fn confirm_payment(
        &self,
        booking_id: i64,
        actor: &CurrentUser,
        payment: PaymentConfirm,
    ) -> Result<Booking> {
        if payment.transaction_id.trim().is_empty() {
            return Err(BookingError::Validation("transaction_id is required".into()));
        }
        self.transition(
            booking_id,
            Some(actor),
            BookingAction::ConfirmPayment,
            TransitionNote {
                reason: None,
                payment: Some(payment),
            },
        )
    }

    pub fn check_in(&self, booking_id: i64, actor: &CurrentUser) -> Result<Booking> {
        self.transition(
            booking_id,
            Some(actor),
            BookingAction::CheckIn,
            TransitionNote::default(),
        )
    }

    pub fn check_out(&self, booking_id: i64, actor: &CurrentUser) -> Result<Booking> {
        self.transition(
            booking_id,
            Some(actor),
            BookingAction::CheckOut,
            TransitionNote::default(),
        )
    }

    /// Admin override, validated by the same state machine
    pub fn update_status(
        &self,
        booking_id: i64,
        actor: &CurrentUser,
        update: BookingStatusUpdate,
    ) -> Result<Booking> {
        let action = BookingAction::for_target(update.status).ok_or_else(|| {
            BookingError::Validation(format!("status cannot be set to {}", update.status))
        })?;
        let reason = clean_reason(update.reason)?;
        self.transition(
            booking_id,
            Some(actor),
            action,
            TransitionNote {
                reason,
                payment: None,
            },
        )
    }

    /// Cancel a booking whose payment window elapsed
    ///
    /// Re-checks the stored status first: returns `Ok(None)` when the booking
    /// is gone or no longer pending (payment arrived in the meantime).
    pub fn expire_if_pending(&self, booking_id: i64) -> Result<Option<Booking>> {
        let outcome = self.write(|txn| {
            let booking = match self.storage.get_booking_txn(txn, booking_id)? {
                Some(b) if b.status == BookingStatus::Pending => b,
                _ => {
                    self.storage.remove_expiration(txn, booking_id)?;
                    return Ok(None);
                }
            };
            let note = TransitionNote {
                reason: Some("payment timeout".into()),
                payment: None,
            };
            self.apply_in_txn(txn, booking, None, BookingAction::Expire, note)
                .map(Some)
        })?;

        if let Some(booking) = &outcome {
            self.after_transition(booking, BookingStatus::Pending, BookingAction::Expire);
        }
        Ok(outcome)
    }

    fn transition(
        &self,
        booking_id: i64,
        actor: Option<&CurrentUser>,
        action: BookingAction,
        note: TransitionNote,
    ) -> Result<Booking> {
        let (booking, previous) = self.write(|txn| {
            let booking = self
                .storage
                .get_booking_txn(txn, booking_id)?
                .ok_or(BookingError::NotFound(booking_id))?;
            let previous = booking.status;
            let updated = self.apply_in_txn(txn, booking, actor, action, note)?;
            Ok((updated, previous))
        })?;

        self.after_transition(&booking, previous, action);
        Ok(booking)
    }

    /// Authorize, advance the state machine and persist (within transaction)
    fn apply_in_txn(
        &self,
        txn: &WriteTransaction,
        mut booking: Booking,
        actor: Option<&CurrentUser>,
        action: BookingAction,
        note: TransitionNote,
    ) -> Result<Booking> {
        if let Some(actor) = actor {
            authorize(actor, &booking, action)?;
        }
        if action == BookingAction::ConfirmPayment
            && !booking.status.is_terminal()
            && booking.status != BookingStatus::Upcoming
            && booking.payment.status == PaymentStatus::Paid
        {
            return Err(BookingError::PaymentAlreadyConfirmed(booking.id));
        }

        let previous = booking.status;
        let next = next_status(booking.kind, previous, action)
            .map_err(|e| BookingError::from_transition(booking.id, e))?;

        let now = now_millis();
        apply_effects(&mut booking, action, actor, note, now);
        booking.status = next;
        booking.updated_at = now;

        if next.is_terminal()
            && let Some(mut venue) = self.storage.get_venue_txn(txn, booking.venue_id)?
            && release(&mut venue, booking.id) > 0
        {
            venue.updated_at = now;
            self.storage.put_venue(txn, &venue)?;
        }
        if previous == BookingStatus::Pending {
            self.storage.remove_expiration(txn, booking.id)?;
        }
        self.storage.put_booking(txn, &booking)?;
        Ok(booking)
    }

    fn after_transition(&self, booking: &Booking, previous: BookingStatus, action: BookingAction) {
        if previous == BookingStatus::Pending {
            self.expiry.cancel(booking.id);
        }
        if booking.status.is_terminal() {
            self.venues.invalidate(booking.venue_id);
        }

        tracing::info!(
            booking_id = booking.id,
            kind = %booking.kind,
            from = %previous,
            to = %booking.status,
            action = %action,
            "Booking transitioned"
        );
        self.notifier
            .booking_event(notification_kind(action), booking);
    }

    // ========== Helpers ==========

    /// Run `f` in a write transaction; commit on success, abort on error
    fn write<T>(&self, f: impl FnOnce(&WriteTransaction) -> Result<T>) -> Result<T> {
        let txn = self.storage.begin_write()?;
        match f(&txn) {
            Ok(value) => {
                txn.commit().map_err(StorageError::from)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort_err) = txn.abort() {
                    tracing::error!(error = %abort_err, "Failed to abort booking transaction");
                }
                Err(e)
            }
        }
    }

    fn cached_venue(&self, kind: VenueKind, venue_id: i64) -> Result<Venue> {
        let venue = self
            .venues
            .get(venue_id)?
            .ok_or(BookingError::VenueNotFound(venue_id))?;
        ensure_bookable(kind, &venue)?;
        Ok(venue)
    }

    /// Validate the request and resolve its coupon
    ///
    /// Coupons are resolved here, outside the booking transaction, because
    /// lazy deactivation needs its own write transaction.
    fn prepare(&self, venue: &Venue, req: &BookingRequest) -> Result<Prepared> {
        let window = ResolvedWindow::from_request(venue.kind, req)?;
        self.ensure_not_past(&window)?;

        let guests = req.guests.unwrap_or(1);
        let quantity = req.quantity.unwrap_or(1);
        let mut prepared = Prepared {
            window,
            guests,
            quantity,
            coupon: None,
        };

        let adjusted = self
            .engine
            .adjusted_subtotal(&pricing_input(venue, &prepared, false))?;
        check_party_size(venue, guests, quantity, req.room_type.as_deref())?;

        if let Some(code) = req
            .coupon_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            prepared.coupon = Some(self.coupons.resolve(code, adjusted, now_millis())?);
        }
        Ok(prepared)
    }

    fn local_now(&self) -> LocalNow {
        let now = Utc::now().with_timezone(&self.settings.business_tz);
        LocalNow {
            date: now.date_naive(),
            time: now.time(),
        }
    }

    fn ensure_not_past(&self, window: &ResolvedWindow) -> Result<()> {
        let now = self.local_now();
        if window.first_date() < now.date {
            return Err(BookingError::DateInPast(format!(
                "{} is in the past",
                window.first_date()
            )));
        }
        if let ResolvedWindow::Slot { date, start, .. } = window
            && *date == now.date
            && *start <= now.time
        {
            return Err(BookingError::DateInPast(format!(
                "{} has already started",
                start.format("%H:%M")
            )));
        }
        Ok(())
    }
}

fn pricing_input<'a>(venue: &'a Venue, prepared: &'a Prepared, first: bool) -> PricingInput<'a> {
    PricingInput {
        kind: venue.kind,
        rates: &venue.rates,
        fees: &venue.fees,
        currency: &venue.currency,
        window: &prepared.window,
        guests: prepared.guests,
        quantity: prepared.quantity,
        first_booking_of_day: first,
    }
}

fn ensure_kind(kind: VenueKind, venue: &Venue) -> Result<()> {
    if venue.kind != kind {
        return Err(BookingError::KindMismatch {
            venue_id: venue.id,
            actual: venue.kind,
            requested: kind,
        });
    }
    Ok(())
}

fn ensure_bookable(kind: VenueKind, venue: &Venue) -> Result<()> {
    ensure_kind(kind, venue)?;
    if !venue.is_active {
        return Err(BookingError::VenueInactive(venue.id));
    }
    Ok(())
}

/// No active booking of the venue starts on `date`
fn is_first_booking_of_day(existing: &[Booking], date: NaiveDate) -> bool {
    !existing.iter().any(|b| {
        b.status.is_active()
            && ResolvedWindow::from_stored(&b.window).is_ok_and(|w| w.first_date() == date)
    })
}

fn clean_reason(reason: Option<String>) -> Result<Option<String>> {
    let reason = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    if reason.as_ref().is_some_and(|r| r.len() > MAX_NOTE_LEN) {
        return Err(BookingError::Validation(format!(
            "reason must be at most {} characters",
            MAX_NOTE_LEN
        )));
    }
    Ok(reason)
}

/// Who may perform `action`; admins may do anything
fn authorize(actor: &CurrentUser, booking: &Booking, action: BookingAction) -> Result<()> {
    if actor.is_admin() {
        return Ok(());
    }
    let is_user = booking.user_id == actor.id;
    let is_owner = booking.owner_id == actor.id;
    let allowed = match action {
        BookingAction::Cancel => is_user || is_owner,
        BookingAction::ConfirmPayment => is_user,
        BookingAction::CheckIn | BookingAction::CheckOut => is_owner,
        BookingAction::Confirm
        | BookingAction::Refund
        | BookingAction::Complete
        | BookingAction::NoShow
        | BookingAction::Expire => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(deny(actor, booking, &action.to_string()))
    }
}

fn deny(actor: &CurrentUser, booking: &Booking, what: &str) -> BookingError {
    security_log!(
        "WARN",
        "booking_access_denied",
        user_id = actor.id.clone(),
        booking_id = booking.id,
        action = what.to_string()
    );
    BookingError::Forbidden(format!("Not allowed to {} booking {}", what, booking.id))
}

fn apply_effects(
    booking: &mut Booking,
    action: BookingAction,
    actor: Option<&CurrentUser>,
    note: TransitionNote,
    now: i64,
) {
    match action {
        BookingAction::ConfirmPayment if booking.payment.status == PaymentStatus::Paid => {
            // Paid at creation; only the status moves
            booking.expires_at = None;
        }
        BookingAction::ConfirmPayment => {
            if let Some(payment) = note.payment {
                booking.payment.transaction_id = Some(payment.transaction_id.trim().to_string());
                if payment.method.is_some() {
                    booking.payment.method = payment.method;
                }
            }
            booking.payment.status = PaymentStatus::Paid;
            booking.payment.paid_amount = booking.breakdown.total;
            booking.payment.paid_at = Some(now);
            booking.payment.updated_at = now;
            booking.expires_at = None;
        }
        BookingAction::Confirm => {
            booking.expires_at = None;
        }
        BookingAction::Cancel | BookingAction::Expire => {
            booking.payment.status = PaymentStatus::Cancelled;
            booking.payment.updated_at = now;
            booking.cancelled_by = Some(
                actor
                    .map(|a| a.id.clone())
                    .unwrap_or_else(|| "system".to_string()),
            );
            booking.cancel_reason = note.reason;
        }
        BookingAction::Refund => {
            booking.payment.status = PaymentStatus::Refunded;
            booking.payment.updated_at = now;
            booking.cancel_reason = note.reason;
        }
        BookingAction::CheckIn => booking.checked_in_at = Some(now),
        BookingAction::CheckOut | BookingAction::Complete => booking.checked_out_at = Some(now),
        BookingAction::NoShow => {}
    }
}

fn notification_kind(action: BookingAction) -> NotificationKind {
    match action {
        BookingAction::Confirm | BookingAction::ConfirmPayment => {
            NotificationKind::BookingConfirmed
        }
        BookingAction::Cancel => NotificationKind::BookingCancelled,
        BookingAction::Expire => NotificationKind::BookingExpired,
        BookingAction::Refund => NotificationKind::BookingRefunded,
        BookingAction::CheckIn => NotificationKind::BookingCheckedIn,
        BookingAction::CheckOut | BookingAction::Complete => NotificationKind::BookingCompleted,
        BookingAction::NoShow => NotificationKind::BookingNoShow,
    }
}

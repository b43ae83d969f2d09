//! Booking lifecycle
//!
//! ```text
//!                ┌──────────── payment ─────────────┐
//!  pending ──────┤                                  ▼
//!     │          └─▶ upcoming ──(confirm/payment)──▶ confirmed ──▶ completed (non-restaurant)
//!     │ expire        │   │                         │
//!     ▼               │   └── check-in ──▶ checked_in ──▶ completed (restaurant)
//! cancelled ◀─────────┴── cancel / refund / no-show from any non-terminal state
//! ```
//!
//! Bookings created with a payment start in upcoming already paid; confirming
//! the payment again only moves them to confirmed.
//!
//! Terminal states (completed, cancelled, refunded, no_show) accept nothing.

use shared::models::{BookingStatus, VenueKind};
use std::fmt;

/// Something that can happen to a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    /// Status-only confirmation (admin)
    Confirm,
    /// Payment recorded
    ConfirmPayment,
    Cancel,
    Refund,
    CheckIn,
    CheckOut,
    /// Admin completion; equals check-out for restaurants
    Complete,
    NoShow,
    /// Payment timeout
    Expire,
}

impl fmt::Display for BookingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Confirm => "confirm",
            Self::ConfirmPayment => "confirm payment for",
            Self::Cancel => "cancel",
            Self::Refund => "refund",
            Self::CheckIn => "check in",
            Self::CheckOut => "check out",
            Self::Complete => "complete",
            Self::NoShow => "mark as no-show",
            Self::Expire => "expire",
        })
    }
}

impl BookingAction {
    /// Action an admin status override to `target` stands for
    pub fn for_target(target: BookingStatus) -> Option<Self> {
        match target {
            BookingStatus::Confirmed => Some(Self::Confirm),
            BookingStatus::CheckedIn => Some(Self::CheckIn),
            BookingStatus::Completed => Some(Self::Complete),
            BookingStatus::Cancelled => Some(Self::Cancel),
            BookingStatus::Refunded => Some(Self::Refund),
            BookingStatus::NoShow => Some(Self::NoShow),
            BookingStatus::Pending | BookingStatus::Upcoming => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    AlreadyCancelled,
    CheckInRequired,
    Invalid {
        from: BookingStatus,
        action: BookingAction,
    },
}

/// Next status for `action`, or why it is refused
pub fn next_status(
    kind: VenueKind,
    current: BookingStatus,
    action: BookingAction,
) -> Result<BookingStatus, TransitionError> {
    use BookingAction as A;
    use BookingStatus as S;

    let invalid = Err(TransitionError::Invalid {
        from: current,
        action,
    });

    if current.is_terminal() {
        return if current == S::Cancelled && action == A::Cancel {
            Err(TransitionError::AlreadyCancelled)
        } else {
            invalid
        };
    }

    let restaurant = kind == VenueKind::Restaurant;
    match (action, current) {
        (A::Confirm | A::ConfirmPayment, S::Pending | S::Upcoming) => Ok(S::Confirmed),
        (A::Cancel, _) => Ok(S::Cancelled),
        (A::Refund, _) => Ok(S::Refunded),
        (A::NoShow, S::Confirmed | S::Upcoming) => Ok(S::NoShow),
        (A::Expire, S::Pending) => Ok(S::Cancelled),

        (A::CheckIn, S::Confirmed | S::Upcoming) if restaurant => Ok(S::CheckedIn),
        (A::CheckOut | A::Complete, S::CheckedIn) if restaurant => Ok(S::Completed),
        (A::CheckOut | A::Complete, S::Confirmed | S::Upcoming) if restaurant => {
            Err(TransitionError::CheckInRequired)
        }
        (A::Complete, S::Confirmed) if !restaurant => Ok(S::Completed),

        _ => invalid,
    }
}

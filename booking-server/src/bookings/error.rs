//! Booking errors and their mapping onto API error codes

use shared::models::{BookingStatus, VenueKind};
use thiserror::Error;

use super::state_machine::{BookingAction, TransitionError};
use crate::availability::AvailabilityError;
use crate::coupons::CouponError;
use crate::pricing::PricingError;
use crate::storage::StorageError;
use crate::utils::{AppError, ErrorCode};
use crate::window::WindowError;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Coupon(#[from] CouponError),

    #[error(transparent)]
    Availability(#[from] AvailabilityError),

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error("Booking not found: {0}")]
    NotFound(i64),

    #[error("Venue not found: {0}")]
    VenueNotFound(i64),

    #[error("Venue {venue_id} is a {actual}, not a {requested}")]
    KindMismatch {
        venue_id: i64,
        actual: VenueKind,
        requested: VenueKind,
    },

    #[error("Venue {0} is not accepting bookings")]
    VenueInactive(i64),

    #[error("Booking {0} has already been cancelled")]
    AlreadyCancelled(i64),

    #[error("Cannot {action} a booking that is {from}")]
    InvalidTransition {
        from: BookingStatus,
        action: BookingAction,
    },

    #[error("Booking must be checked in first")]
    CheckInRequired,

    #[error("Payment for booking {0} is already confirmed")]
    PaymentAlreadyConfirmed(i64),

    #[error("{0}")]
    DateInPast(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),
}

impl BookingError {
    pub(crate) fn from_transition(booking_id: i64, err: TransitionError) -> Self {
        match err {
            TransitionError::AlreadyCancelled => Self::AlreadyCancelled(booking_id),
            TransitionError::CheckInRequired => Self::CheckInRequired,
            TransitionError::Invalid { from, action } => Self::InvalidTransition { from, action },
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Storage(e) => {
                tracing::error!(error = %e, "Booking storage error");
                AppError::database(e.to_string())
            }
            BookingError::Pricing(e) => match e {
                PricingError::DurationOutOfRange { .. } => {
                    AppError::with_message(ErrorCode::DurationOutOfRange, e.to_string())
                }
                PricingError::GuestsOutOfRange(msg) => {
                    AppError::with_message(ErrorCode::GuestsOutOfRange, msg)
                }
                PricingError::InvalidQuantity(_) | PricingError::InvalidRate(_) => {
                    AppError::validation(e.to_string())
                }
            },
            BookingError::Coupon(e) => e.into(),
            BookingError::Availability(e) => e.into(),
            BookingError::Window(e) => AppError::validation(e.to_string()),
            BookingError::NotFound(id) => {
                AppError::new(ErrorCode::BookingNotFound).with_detail("booking_id", id)
            }
            BookingError::VenueNotFound(id) => {
                AppError::new(ErrorCode::VenueNotFound).with_detail("venue_id", id)
            }
            e @ BookingError::KindMismatch { .. } => {
                AppError::with_message(ErrorCode::VenueKindMismatch, e.to_string())
            }
            BookingError::VenueInactive(id) => {
                AppError::new(ErrorCode::VenueInactive).with_detail("venue_id", id)
            }
            BookingError::AlreadyCancelled(id) => {
                AppError::new(ErrorCode::BookingAlreadyCancelled).with_detail("booking_id", id)
            }
            e @ BookingError::InvalidTransition { .. } => {
                AppError::with_message(ErrorCode::InvalidTransition, e.to_string())
            }
            BookingError::CheckInRequired => AppError::new(ErrorCode::CheckInRequired),
            BookingError::PaymentAlreadyConfirmed(id) => {
                AppError::new(ErrorCode::PaymentAlreadyConfirmed).with_detail("booking_id", id)
            }
            BookingError::DateInPast(msg) => AppError::with_message(ErrorCode::DateInPast, msg),
            BookingError::Forbidden(msg) => {
                AppError::with_message(ErrorCode::NotBookingParty, msg)
            }
            BookingError::Validation(msg) => AppError::validation(msg),
        }
    }
}

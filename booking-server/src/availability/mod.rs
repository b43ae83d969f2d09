//! Availability
//!
//! Slot and resource contention for every vertical:
//!
//! - tables (restaurant, cafe) and rooms (hotel) are discrete units with an
//!   occupancy flag, claimed smallest-fitting-tier first;
//! - halls are a date-range resource split into sections, checked against
//!   overlapping active bookings.

mod claims;
mod slots;

pub use claims::{ClaimRequest, check_party_size, claim, release};
pub use slots::{LocalNow, list_available_slots};

use thiserror::Error;

use crate::utils::{AppError, ErrorCode};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AvailabilityError {
    #[error("Sub-resource not found: {0}")]
    SubResourceNotFound(i64),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    GuestsOutOfRange(String),

    #[error("{0}")]
    InvalidQuantity(String),
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::SubResourceNotFound(id) => {
                AppError::new(ErrorCode::SubResourceNotFound).with_detail("id", id)
            }
            AvailabilityError::Unavailable(msg) => {
                AppError::with_message(ErrorCode::ResourceUnavailable, msg)
            }
            AvailabilityError::GuestsOutOfRange(msg) => {
                AppError::with_message(ErrorCode::GuestsOutOfRange, msg)
            }
            AvailabilityError::InvalidQuantity(msg) => AppError::validation(msg),
        }
    }
}

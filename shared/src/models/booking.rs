//! Booking Model

use super::pricing::PricingBreakdown;
use super::venue::VenueKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Booking status (预订状态)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Created without payment, held until the payment timeout
    Pending,
    /// Paid table booking awaiting the visit (restaurant, cafe)
    Upcoming,
    Confirmed,
    CheckedIn,
    Completed,
    Cancelled,
    Refunded,
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Upcoming => "upcoming",
            Self::Confirmed => "confirmed",
            Self::CheckedIn => "checked_in",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::NoShow => "no_show",
        }
    }

    /// No further transition accepted
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Cancelled | Self::Refunded | Self::NoShow
        )
    }

    /// Booking still holds its claimed resource
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Cancelled,
    Refunded,
}

/// Payment sub-record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub status: PaymentStatus,
    pub method: Option<String>,
    pub transaction_id: Option<String>,
    pub paid_amount: f64,
    pub paid_at: Option<i64>,
    pub updated_at: i64,
}

/// Reserved time window
///
/// Dates use `YYYY-MM-DD`, times use `HH:MM`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingWindow {
    /// Same-day time slot (restaurant, cafe)
    Slot {
        date: String,
        start_time: String,
        end_time: String,
    },
    /// Hotel stay; check-out date is exclusive
    Stay { check_in: String, check_out: String },
    /// Hall date range; both ends inclusive
    Days { start_date: String, end_date: String },
}

/// Booking entity (预订)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: i64,
    pub kind: VenueKind,
    pub venue_id: i64,
    /// Venue owner at booking time
    pub owner_id: String,
    pub user_id: String,
    /// Claimed tables / rooms (empty for halls)
    #[serde(default)]
    pub sub_resource_ids: Vec<i64>,
    pub window: BookingWindow,
    pub guests: i32,
    /// Tables, rooms or hall sections requested
    pub quantity: i32,
    pub status: BookingStatus,
    pub breakdown: PricingBreakdown,
    pub coupon_code: Option<String>,
    pub payment: Payment,
    pub checked_in_at: Option<i64>,
    pub checked_out_at: Option<i64>,
    pub cancelled_by: Option<String>,
    pub cancel_reason: Option<String>,
    /// Payment deadline for pending bookings (Unix millis)
    pub expires_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Payment fields supplied at creation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentInput {
    pub method: Option<String>,
    pub transaction_id: Option<String>,
}

/// Preview / create booking payload
///
/// Which window fields are required depends on the venue type:
/// `date`/`start_time`/`end_time` for restaurants and cafes,
/// `check_in`/`check_out` for hotels, `start_date`/`end_date` for halls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingRequest {
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub guests: Option<i32>,
    /// Tables (cafe), rooms (hotel) or sections (hall); defaults to 1
    pub quantity: Option<i32>,
    pub table_id: Option<i64>,
    pub room_id: Option<i64>,
    pub room_type: Option<String>,
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub payment: Option<PaymentInput>,
}

/// Admin status override payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingStatusUpdate {
    pub status: BookingStatus,
    pub reason: Option<String>,
}

/// Cancel payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingCancel {
    pub reason: Option<String>,
}

/// Payment confirmation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirm {
    pub transaction_id: String,
    pub method: Option<String>,
}

/// Result of a successful creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCreated {
    pub booking: Booking,
    pub breakdown: PricingBreakdown,
}

/// "My bookings" grouped by vertical
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MyBookings {
    pub hotel: Vec<Booking>,
    pub cafe: Vec<Booking>,
    pub restaurant: Vec<Booking>,
    pub hall: Vec<Booking>,
}

impl MyBookings {
    pub fn push(&mut self, booking: Booking) {
        match booking.kind {
            VenueKind::Hotel => self.hotel.push(booking),
            VenueKind::Cafe => self.cafe.push(booking),
            VenueKind::Restaurant => self.restaurant.push(booking),
            VenueKind::Hall => self.hall.push(booking),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::Refunded.is_terminal());
        assert!(BookingStatus::NoShow.is_terminal());
        assert!(BookingStatus::Pending.is_active());
        assert!(BookingStatus::CheckedIn.is_active());
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&BookingStatus::NoShow).unwrap();
        assert_eq!(json, "\"no_show\"");
        let status: BookingStatus = serde_json::from_str("\"checked_in\"").unwrap();
        assert_eq!(status, BookingStatus::CheckedIn);
        assert_eq!(status.to_string(), "checked_in");
    }

    #[test]
    fn test_window_tagged_serde() {
        let window = BookingWindow::Stay {
            check_in: "2026-03-02".into(),
            check_out: "2026-03-05".into(),
        };
        let json = serde_json::to_value(&window).unwrap();
        assert_eq!(json["type"], "stay");
        assert_eq!(json["check_in"], "2026-03-02");

        let back: BookingWindow = serde_json::from_value(json).unwrap();
        assert_eq!(back, window);
    }
}

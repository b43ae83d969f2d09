//! Venue Model
//!
//! A venue is the aggregate root for everything a booking can claim:
//! dining tables (restaurant, cafe), rooms (hotel) or the hall itself.

use crate::error::{AppError, ErrorCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bookable vertical
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum VenueKind {
    Hotel,
    Cafe,
    Restaurant,
    Hall,
}

impl VenueKind {
    pub const ALL: [VenueKind; 4] = [
        VenueKind::Hotel,
        VenueKind::Cafe,
        VenueKind::Restaurant,
        VenueKind::Hall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hotel => "hotel",
            Self::Cafe => "cafe",
            Self::Restaurant => "restaurant",
            Self::Hall => "hall",
        }
    }

    /// Booked by time slot within a single day (tables)
    pub fn is_slot_based(&self) -> bool {
        matches!(self, Self::Cafe | Self::Restaurant)
    }
}

impl fmt::Display for VenueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VenueKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hotel" | "hotels" => Ok(Self::Hotel),
            "cafe" | "cafes" => Ok(Self::Cafe),
            "restaurant" | "restaurants" => Ok(Self::Restaurant),
            "hall" | "halls" => Ok(Self::Hall),
            other => Err(AppError::with_message(
                ErrorCode::InvalidRequest,
                format!("Unsupported venue type: {}", other),
            )
            .with_detail("venue_type", other.to_string())),
        }
    }
}

/// Unit rate (per room-night / per table-hour / per guest / per hall-day)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateCard {
    pub unit_rate: f64,
}

/// Tax and fixed fees applied on top of the discounted subtotal
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeeSchedule {
    /// Tax percentage (12 = 12%)
    #[serde(default)]
    pub tax_percentage: f64,
    #[serde(default)]
    pub service_fee: f64,
    #[serde(default)]
    pub reservation_fee: f64,
    #[serde(default)]
    pub platform_fee: f64,
}

/// Dining table entity (桌台)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiningTable {
    pub id: i64,
    pub name: String,
    /// Seats; tables sharing a capacity form a tier
    pub capacity: i32,
    #[serde(default)]
    pub is_booked: bool,
    #[serde(default)]
    pub current_booking: Option<i64>,
}

/// Hotel room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub room_type: String,
    pub capacity: i32,
    #[serde(default)]
    pub is_booked: bool,
    #[serde(default)]
    pub current_booking: Option<i64>,
}

/// Hall layout; the hall itself is the date-range resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HallSpec {
    /// Independently bookable sections (1 = whole hall only)
    pub sections: i32,
    pub max_guests: i32,
}

/// Opening hours for slot-based venues
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpeningHours {
    /// Opening time (HH:MM format)
    pub open: String,
    /// Closing time (HH:MM format)
    pub close: String,
    /// Slot length in minutes
    pub slot_minutes: u32,
}

/// Venue entity (场所)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Venue {
    pub id: i64,
    pub kind: VenueKind,
    pub name: String,
    pub owner_id: String,
    pub currency: String,
    pub rates: RateCard,
    #[serde(default)]
    pub fees: FeeSchedule,
    #[serde(default)]
    pub tables: Vec<DiningTable>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub hall: Option<HallSpec>,
    #[serde(default)]
    pub opening: Option<OpeningHours>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Venue {
    pub fn table(&self, id: i64) -> Option<&DiningTable> {
        self.tables.iter().find(|t| t.id == id)
    }

    pub fn room(&self, id: i64) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    /// Ids of tables/rooms currently held by the given booking
    pub fn units_held_by(&self, booking_id: i64) -> Vec<i64> {
        let tables = self
            .tables
            .iter()
            .filter(|t| t.current_booking == Some(booking_id))
            .map(|t| t.id);
        let rooms = self
            .rooms
            .iter()
            .filter(|r| r.current_booking == Some(booking_id))
            .map(|r| r.id);
        tables.chain(rooms).collect()
    }
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableCreate {
    pub name: String,
    pub capacity: i32,
}

/// Create room payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomCreate {
    pub name: String,
    pub room_type: String,
    pub capacity: i32,
}

/// Create venue payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueCreate {
    pub name: String,
    /// Admins may create on behalf of an owner; defaults to the caller
    pub owner_id: Option<String>,
    pub currency: Option<String>,
    pub rates: RateCard,
    #[serde(default)]
    pub fees: FeeSchedule,
    #[serde(default)]
    pub tables: Vec<DiningTableCreate>,
    #[serde(default)]
    pub rooms: Vec<RoomCreate>,
    pub hall: Option<HallSpec>,
    pub opening: Option<OpeningHours>,
}

/// Free capacity for one window of the queried date
///
/// Slot venues report one entry per opening-hours slot; hotels and halls
/// report a single whole-day entry without times.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotAvailability {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Free tables / rooms, or free hall sections
    pub available: i32,
}

/// Availability query result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityReport {
    pub venue_id: i64,
    pub kind: VenueKind,
    pub date: String,
    pub party_size: Option<i32>,
    pub slots: Vec<SlotAvailability>,
}

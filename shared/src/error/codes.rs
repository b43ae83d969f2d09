//! Unified error codes for the booking platform
//!
//! This module defines all error codes used across booking-server and its clients.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Booking errors
//! - 5xxx: Payment errors
//! - 6xxx: Coupon errors
//! - 7xxx: Venue / resource errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,
    /// Admin role required
    AdminRequired = 2003,
    /// Actor is neither the booking user, the venue owner nor an admin
    NotBookingParty = 2004,

    // ==================== 4xxx: Booking ====================
    /// Booking not found
    BookingNotFound = 4001,
    /// Booking has already been cancelled
    BookingAlreadyCancelled = 4002,
    /// Status transition is not allowed
    InvalidTransition = 4003,
    /// Check-out requires a recorded check-in
    CheckInRequired = 4004,
    /// Requested date lies in the past
    DateInPast = 4005,
    /// Requested duration is zero or exceeds the vertical cap
    DurationOutOfRange = 4006,
    /// Guest count exceeds what the venue can seat
    GuestsOutOfRange = 4007,

    // ==================== 5xxx: Payment ====================
    /// Payment processing failed
    PaymentFailed = 5001,
    /// Payment has already been confirmed
    PaymentAlreadyConfirmed = 5002,
    /// Payment has already been refunded
    PaymentAlreadyRefunded = 5004,

    // ==================== 6xxx: Coupon ====================
    /// Coupon not found
    CouponNotFound = 6001,
    /// Coupon has expired
    CouponExpired = 6002,
    /// Coupon is inactive
    CouponInactive = 6003,
    /// Coupon value is invalid
    CouponInvalidValue = 6004,
    /// Coupon code already exists
    CouponCodeExists = 6005,

    // ==================== 7xxx: Venue / Resource ====================
    /// Venue not found
    VenueNotFound = 7001,
    /// Table or room not found in the venue
    SubResourceNotFound = 7002,
    /// No free table/room/section for the request
    ResourceUnavailable = 7003,
    /// Requested window overlaps an existing booking
    WindowConflict = 7004,
    /// Venue type in path does not match the stored venue
    VenueKindMismatch = 7005,
    /// Venue is not accepting bookings
    VenueInactive = 7006,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// External collaborator failed (notification, webhook)
    ExternalServiceError = 9006,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenExpired => "Token has expired",
            ErrorCode::TokenInvalid => "Token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role required",
            ErrorCode::AdminRequired => "Admin role required",
            ErrorCode::NotBookingParty => "Not allowed to act on this booking",

            // Booking
            ErrorCode::BookingNotFound => "Booking not found",
            ErrorCode::BookingAlreadyCancelled => "Booking has already been cancelled",
            ErrorCode::InvalidTransition => "Booking status transition is not allowed",
            ErrorCode::CheckInRequired => "Booking must be checked in first",
            ErrorCode::DateInPast => "Requested date is in the past",
            ErrorCode::DurationOutOfRange => "Requested duration is out of range",
            ErrorCode::GuestsOutOfRange => "Guest count is out of range",

            // Payment
            ErrorCode::PaymentFailed => "Payment processing failed",
            ErrorCode::PaymentAlreadyConfirmed => "Payment has already been confirmed",
            ErrorCode::PaymentAlreadyRefunded => "Payment has already been refunded",

            // Coupon
            ErrorCode::CouponNotFound => "Coupon not found",
            ErrorCode::CouponExpired => "Coupon has expired",
            ErrorCode::CouponInactive => "Coupon is inactive",
            ErrorCode::CouponInvalidValue => "Coupon value is invalid",
            ErrorCode::CouponCodeExists => "Coupon code already exists",

            // Venue
            ErrorCode::VenueNotFound => "Venue not found",
            ErrorCode::SubResourceNotFound => "Table or room not found",
            ErrorCode::ResourceUnavailable => "Resource is already booked",
            ErrorCode::WindowConflict => "Requested window conflicts with an existing booking",
            ErrorCode::VenueKindMismatch => "Venue type does not match",
            ErrorCode::VenueInactive => "Venue is not accepting bookings",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::ExternalServiceError => "External service error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),
            2003 => Ok(ErrorCode::AdminRequired),
            2004 => Ok(ErrorCode::NotBookingParty),

            // Booking
            4001 => Ok(ErrorCode::BookingNotFound),
            4002 => Ok(ErrorCode::BookingAlreadyCancelled),
            4003 => Ok(ErrorCode::InvalidTransition),
            4004 => Ok(ErrorCode::CheckInRequired),
            4005 => Ok(ErrorCode::DateInPast),
            4006 => Ok(ErrorCode::DurationOutOfRange),
            4007 => Ok(ErrorCode::GuestsOutOfRange),

            // Payment
            5001 => Ok(ErrorCode::PaymentFailed),
            5002 => Ok(ErrorCode::PaymentAlreadyConfirmed),
            5004 => Ok(ErrorCode::PaymentAlreadyRefunded),

            // Coupon
            6001 => Ok(ErrorCode::CouponNotFound),
            6002 => Ok(ErrorCode::CouponExpired),
            6003 => Ok(ErrorCode::CouponInactive),
            6004 => Ok(ErrorCode::CouponInvalidValue),
            6005 => Ok(ErrorCode::CouponCodeExists),

            // Venue
            7001 => Ok(ErrorCode::VenueNotFound),
            7002 => Ok(ErrorCode::SubResourceNotFound),
            7003 => Ok(ErrorCode::ResourceUnavailable),
            7004 => Ok(ErrorCode::WindowConflict),
            7005 => Ok(ErrorCode::VenueKindMismatch),
            7006 => Ok(ErrorCode::VenueInactive),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),
            9006 => Ok(ErrorCode::ExternalServiceError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

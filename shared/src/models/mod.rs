//! Data models
//!
//! Shared between booking-server and its clients (via API).
//! Venue, booking and snowflake IDs are `i64`; user IDs are JWT subjects.

pub mod booking;
pub mod coupon;
pub mod notification;
pub mod pricing;
pub mod venue;

// Re-exports
pub use booking::*;
pub use coupon::*;
pub use notification::*;
pub use pricing::*;
pub use venue::*;

//! Notification Model
//!
//! Fire-and-forget events emitted by the booking lifecycle.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingCreated,
    BookingConfirmed,
    BookingCancelled,
    BookingExpired,
    BookingRefunded,
    BookingCheckedIn,
    BookingCompleted,
    BookingNoShow,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationEvent {
    /// Venue owner receiving the notification
    pub admin_id: String,
    pub user_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
}

//! 通知服务
//!
//! 预订状态变化后向场所管理员/用户推送通知。
//! 派发是 fire-and-forget：失败只记录日志，不影响已提交的业务操作。

use std::sync::Arc;

use async_trait::async_trait;
use shared::models::{Booking, NotificationEvent, NotificationKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Webhook request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Webhook rejected notification: {0}")]
    Rejected(reqwest::StatusCode),
}

/// Notification sink
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, event: &NotificationEvent) -> Result<(), NotifyError>;
}

/// Writes notifications to the log only
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        tracing::info!(
            kind = ?event.kind,
            admin_id = %event.admin_id,
            user_id = ?event.user_id,
            title = %event.title,
            "Notification"
        );
        Ok(())
    }
}

/// POSTs each notification as JSON to a webhook
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        let resp = self.client.post(&self.url).json(event).send().await?;
        if !resp.status().is_success() {
            return Err(NotifyError::Rejected(resp.status()));
        }
        Ok(())
    }
}

/// Spawns notification delivery off the request path
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Webhook when a URL is configured, log-only otherwise
    pub fn from_webhook_url(url: Option<&str>) -> Self {
        match url {
            Some(url) => {
                tracing::info!(url = %url, "Notifications delivered via webhook");
                Self::new(Arc::new(WebhookNotifier::new(url)))
            }
            None => Self::new(Arc::new(LogNotifier)),
        }
    }

    pub fn dispatch(&self, event: NotificationEvent) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.send(&event).await {
                tracing::warn!(kind = ?event.kind, error = %e, "Failed to deliver notification");
            }
        });
    }

    /// Notify the venue owner about a booking change
    pub fn booking_event(&self, kind: NotificationKind, booking: &Booking) {
        self.dispatch(booking_notification(kind, booking));
    }
}

pub fn booking_notification(kind: NotificationKind, booking: &Booking) -> NotificationEvent {
    let title = match kind {
        NotificationKind::BookingCreated => "New booking",
        NotificationKind::BookingConfirmed => "Booking confirmed",
        NotificationKind::BookingCancelled => "Booking cancelled",
        NotificationKind::BookingExpired => "Booking expired",
        NotificationKind::BookingRefunded => "Booking refunded",
        NotificationKind::BookingCheckedIn => "Guest checked in",
        NotificationKind::BookingCompleted => "Booking completed",
        NotificationKind::BookingNoShow => "Guest did not show up",
    };
    NotificationEvent {
        admin_id: booking.owner_id.clone(),
        user_id: Some(booking.user_id.clone()),
        title: format!("{} #{}", title, booking.id),
        description: Some(format!(
            "{} booking at venue {} is now {}",
            booking.kind, booking.venue_id, booking.status
        )),
        image: None,
        kind,
    }
}

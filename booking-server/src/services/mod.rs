//! 服务层 - 外部协作方
//!
//! # 服务列表
//!
//! - [`NotificationDispatcher`] - 预订通知派发 (日志 / webhook)

pub mod notification;

pub use notification::{LogNotifier, NotificationDispatcher, Notifier, NotifyError, WebhookNotifier};

//! 预订生命周期
//!
//! - [`BookingService`] - 报价、创建、状态流转
//! - [`state_machine`] - 状态机定义
//! - [`expiry`] - 未支付预订的超时取消

mod error;
pub mod expiry;
mod service;
pub mod state_machine;

pub use error::BookingError;
pub use expiry::{ExpiryScheduler, ExpiryWorker};
pub use service::{BookingService, BookingSettings};
pub use state_machine::BookingAction;

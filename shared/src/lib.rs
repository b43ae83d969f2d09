//! Shared types for the booking platform
//!
//! Common types used across crates: domain models, the unified error
//! system, response structures and id/time utilities.

pub mod error;
pub mod models;
pub mod types;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

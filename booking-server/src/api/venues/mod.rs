//! Venue Routes
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/venues/{venue_type} | POST | 创建场所 (owner/admin) |
//! | /api/venues/{venue_type}/{venue_id} | GET | 场所详情 |
//! | /api/venues/{venue_type}/{venue_id}/availability | GET | 可用时段 |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/venues/{venue_type}", post(handler::create))
        .route("/api/venues/{venue_type}/{venue_id}", get(handler::get_by_id))
        .route(
            "/api/venues/{venue_type}/{venue_id}/availability",
            get(handler::availability),
        )
}

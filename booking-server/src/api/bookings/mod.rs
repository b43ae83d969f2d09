//! Booking Routes
//!
//! - 下单/报价挂在场所路径下: `/api/venues/{venue_type}/{venue_id}/bookings[/preview]`
//! - 其余操作按预订 id: `/api/bookings/{id}/...`
//! - `PATCH /api/bookings/{id}/status` 仅管理员

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(
            "/api/venues/{venue_type}/{venue_id}/bookings",
            post(handler::create),
        )
        .route(
            "/api/venues/{venue_type}/{venue_id}/bookings/preview",
            post(handler::preview),
        )
        .route("/api/bookings/mine", get(handler::mine))
        .route("/api/bookings/{id}", get(handler::get_by_id))
        .route("/api/bookings/{id}/cancel", patch(handler::cancel))
        .route("/api/bookings/{id}/payment", patch(handler::confirm_payment))
        .route("/api/bookings/{id}/check-in", patch(handler::check_in))
        .route("/api/bookings/{id}/check-out", patch(handler::check_out))
        .merge(admin_routes())
}

fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/api/bookings/{id}/status", patch(handler::update_status))
        .layer(middleware::from_fn(require_admin))
}

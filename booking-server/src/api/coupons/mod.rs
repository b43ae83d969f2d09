//! Coupon Routes
//!
//! - `POST /api/coupons` - 管理员创建优惠券
//! - `GET /api/coupons/{code}` - 查询优惠券

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/coupons/{code}", get(handler::get_by_code))
        .merge(
            Router::new()
                .route("/api/coupons", post(handler::create))
                .layer(middleware::from_fn(require_admin)),
        )
}

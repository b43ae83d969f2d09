//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`venues`] - 场所、报价、下单、可用时段
//! - [`bookings`] - 预订查询与状态流转
//! - [`coupons`] - 优惠券管理

use axum::middleware as axum_middleware;
use axum::{Json, Router};
use http::{HeaderName, HeaderValue};
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult};
use shared::models::VenueKind;

pub mod bookings;
pub mod coupons;
pub mod health;
pub mod middleware;
pub mod venues;

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        // Health API - public route
        .merge(health::router())
        // Venue API - authentication required
        .merge(venues::router())
        // Booking API - authentication required, status override admin only
        .merge(bookings::router())
        // Coupon API - creation admin only
        .merge(coupons::router())
}

/// Build a fully configured application with all middleware
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    build_router()
        // ========== Tower HTTP Middleware ==========
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Compression - Gzip compress responses
        .layer(CompressionLayer::new())
        // Abort handlers that run past the request budget
        .layer(TimeoutLayer::new(Duration::from_millis(
            state.config.request_timeout_ms,
        )))
        // Request logging
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        // Trace - Request tracing
        .layer(TraceLayer::new_for_http())
        // ========== Application Middleware ==========
        // Request ID - Generate unique ID for each request
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        // Propagate request ID to response
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        // JWT authentication for /api/* - injects CurrentUser
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ))
}

/// Handler result wrapped in the unified `{code, message, data}` envelope
pub type ApiResult<T> = AppResult<Json<ApiResponse<T>>>;

pub(crate) fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

/// `{venue_type}` path segment
pub(crate) fn parse_venue_kind(venue_type: &str) -> AppResult<VenueKind> {
    venue_type.parse()
}

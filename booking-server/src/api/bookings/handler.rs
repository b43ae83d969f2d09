//! Booking API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{
    Booking, BookingCancel, BookingCreated, BookingRequest, BookingStatusUpdate, MyBookings,
    PaymentConfirm, PricingBreakdown,
};

use crate::api::{ApiResult, ok, parse_venue_kind};
use crate::auth::CurrentUser;
use crate::core::ServerState;

/// POST /api/venues/{venue_type}/{venue_id}/bookings/preview - 报价 (不占用资源)
pub async fn preview(
    State(state): State<ServerState>,
    Path((venue_type, venue_id)): Path<(String, i64)>,
    Json(req): Json<BookingRequest>,
) -> ApiResult<PricingBreakdown> {
    let kind = parse_venue_kind(&venue_type)?;
    ok(state.bookings.preview(kind, venue_id, &req)?)
}

/// POST /api/venues/{venue_type}/{venue_id}/bookings - 创建预订
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path((venue_type, venue_id)): Path<(String, i64)>,
    Json(req): Json<BookingRequest>,
) -> ApiResult<BookingCreated> {
    let kind = parse_venue_kind(&venue_type)?;
    ok(state.bookings.create(kind, venue_id, req, &user)?)
}

/// GET /api/bookings/mine - 当前用户的预订 (按类型分组)
pub async fn mine(State(state): State<ServerState>, user: CurrentUser) -> ApiResult<MyBookings> {
    ok(state.bookings.my_bookings(&user)?)
}

/// GET /api/bookings/{id} - 预订详情
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Booking> {
    ok(state.bookings.get(id, &user)?)
}

/// PATCH /api/bookings/{id}/cancel - 取消预订
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    payload: Option<Json<BookingCancel>>,
) -> ApiResult<Booking> {
    let reason = payload.and_then(|Json(p)| p.reason);
    ok(state.bookings.cancel(id, &user, reason)?)
}

/// PATCH /api/bookings/{id}/payment - 确认支付
pub async fn confirm_payment(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payment): Json<PaymentConfirm>,
) -> ApiResult<Booking> {
    ok(state.bookings.confirm_payment(id, &user, payment)?)
}

/// PATCH /api/bookings/{id}/check-in - 餐厅入座
pub async fn check_in(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Booking> {
    ok(state.bookings.check_in(id, &user)?)
}

/// PATCH /api/bookings/{id}/check-out - 餐厅离座
pub async fn check_out(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Booking> {
    ok(state.bookings.check_out(id, &user)?)
}

/// PATCH /api/bookings/{id}/status - 管理员状态变更
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(update): Json<BookingStatusUpdate>,
) -> ApiResult<Booking> {
    ok(state.bookings.update_status(id, &user, update)?)
}

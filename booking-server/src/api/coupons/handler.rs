//! Coupon API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{Coupon, CouponCreate};

use crate::api::{ApiResult, ok};
use crate::auth::CurrentUser;
use crate::core::ServerState;

/// POST /api/coupons - 创建优惠券
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CouponCreate>,
) -> ApiResult<Coupon> {
    let coupon = state.coupons.create(payload)?;
    tracing::info!(coupon = %coupon.code, admin_id = %user.id, "Coupon registered");
    ok(coupon)
}

/// GET /api/coupons/{code} - 查询优惠券
pub async fn get_by_code(
    State(state): State<ServerState>,
    Path(code): Path<String>,
) -> ApiResult<Coupon> {
    ok(state.coupons.get(&code)?)
}

//! Venue API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{AvailabilityReport, Venue, VenueCreate};
use validator::Validate;

use crate::api::{ApiResult, ok, parse_venue_kind};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppError;
use crate::utils::time::parse_date;

/// `?date=YYYY-MM-DD&partySize=N`
#[derive(Debug, Deserialize, Validate)]
pub struct AvailabilityQuery {
    #[validate(length(equal = 10, message = "date must be YYYY-MM-DD"))]
    pub date: String,
    #[serde(default, alias = "partySize")]
    #[validate(range(min = 1, max = 10000, message = "partySize must be at least 1"))]
    pub party_size: Option<i32>,
}

/// POST /api/venues/{venue_type} - 创建场所
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(venue_type): Path<String>,
    Json(payload): Json<VenueCreate>,
) -> ApiResult<Venue> {
    let kind = parse_venue_kind(&venue_type)?;
    ok(state.venues.create(kind, payload, &user)?)
}

/// GET /api/venues/{venue_type}/{venue_id} - 场所详情
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path((venue_type, venue_id)): Path<(String, i64)>,
) -> ApiResult<Venue> {
    let kind = parse_venue_kind(&venue_type)?;
    ok(state.venues.get_of_kind(kind, venue_id)?)
}

/// GET /api/venues/{venue_type}/{venue_id}/availability - 指定日期的可用时段
pub async fn availability(
    State(state): State<ServerState>,
    Path((venue_type, venue_id)): Path<(String, i64)>,
    Query(query): Query<AvailabilityQuery>,
) -> ApiResult<AvailabilityReport> {
    query
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let kind = parse_venue_kind(&venue_type)?;
    let date = parse_date(&query.date)?;
    ok(state
        .bookings
        .availability(kind, venue_id, date, query.party_size)?)
}

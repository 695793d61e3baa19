//! Match endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use domain::models::{
    CreateMatchRequest, ListMatchesResponse, MatchResponse, NearbyMatchesQuery, UpdateMatchRequest,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Caller;

/// POST /api/v1/matches
///
/// Creates a match hosted by the caller.
pub async fn create_match(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    Json(request): Json<CreateMatchRequest>,
) -> Result<(StatusCode, Json<MatchResponse>), ApiError> {
    request.validate()?;
    shared::validation::validate_time_order(request.start_time, request.end_time)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let created = state.match_service.create(user_id, request).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// GET /api/v1/matches/nearby
///
/// Radius search around a coordinate, nearest first, cursor-paginated.
pub async fn nearby_matches(
    State(state): State<AppState>,
    Query(query): Query<NearbyMatchesQuery>,
) -> Result<Json<ListMatchesResponse>, ApiError> {
    query.validate()?;
    let page = state.match_service.nearby(query).await?;
    Ok(Json(page))
}

/// GET /api/v1/matches/hosted
///
/// Matches hosted by the caller, newest first.
pub async fn hosted_matches(
    State(state): State<AppState>,
    Caller(user_id): Caller,
) -> Result<Json<ListMatchesResponse>, ApiError> {
    let matches: Vec<MatchResponse> = state
        .match_service
        .list_by_host(user_id)
        .await?
        .into_iter()
        .map(MatchResponse::from)
        .collect();
    let total = matches.len();
    Ok(Json(ListMatchesResponse {
        matches,
        total,
        next_cursor: None,
    }))
}

/// GET /api/v1/matches/:match_id
pub async fn get_match(
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
) -> Result<Json<MatchResponse>, ApiError> {
    let m = state.match_service.get(match_id).await?;
    Ok(Json(m.into()))
}

/// PATCH /api/v1/matches/:match_id
///
/// Host-only partial update of an open match.
pub async fn update_match(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    Path(match_id): Path<Uuid>,
    Json(request): Json<UpdateMatchRequest>,
) -> Result<Json<MatchResponse>, ApiError> {
    request.validate()?;
    let updated = state
        .match_service
        .update(match_id, user_id, request)
        .await?;
    Ok(Json(updated.into()))
}

/// POST /api/v1/matches/:match_id/cancel
pub async fn cancel_match(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    Path(match_id): Path<Uuid>,
) -> Result<Json<MatchResponse>, ApiError> {
    let cancelled = state.match_service.cancel(match_id, user_id).await?;
    Ok(Json(cancelled.into()))
}

/// POST /api/v1/matches/:match_id/reactivate
pub async fn reactivate_match(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    Path(match_id): Path<Uuid>,
) -> Result<Json<MatchResponse>, ApiError> {
    let reactivated = state.match_service.reactivate(match_id, user_id).await?;
    Ok(Json(reactivated.into()))
}

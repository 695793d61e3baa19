//! Participation endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use domain::models::{ListParticipationsResponse, ParticipationResponse};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Caller;
use crate::middleware::metrics::record_join_outcome;
use crate::services::ServiceError;

/// POST /api/v1/matches/:match_id/participations
///
/// Requests to join a match. The request stays PENDING until the host
/// approves it.
pub async fn join_match(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    Path(match_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ParticipationResponse>), ApiError> {
    match state.participation_service.join(match_id, user_id).await {
        Ok(p) => {
            record_join_outcome("accepted");
            Ok((StatusCode::CREATED, Json(p.into())))
        }
        Err(err) => {
            record_join_outcome(match &err {
                ServiceError::Conflict | ServiceError::VersionConflict => "conflict",
                ServiceError::Domain(_) => "rejected",
                _ => "error",
            });
            Err(err.into())
        }
    }
}

/// DELETE /api/v1/matches/:match_id/participations
///
/// Cancels the caller's confirmed participation, releasing its slot.
pub async fn cancel_participation(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    Path(match_id): Path<Uuid>,
) -> Result<Json<ParticipationResponse>, ApiError> {
    let cancelled = state
        .participation_service
        .cancel(match_id, user_id)
        .await?;
    Ok(Json(cancelled.into()))
}

/// GET /api/v1/matches/:match_id/participations
///
/// Roster of a match, cancelled records excluded, oldest first.
pub async fn list_participations(
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
) -> Result<Json<ListParticipationsResponse>, ApiError> {
    let participations: Vec<ParticipationResponse> = state
        .participation_service
        .roster(match_id)
        .await?
        .into_iter()
        .map(ParticipationResponse::from)
        .collect();
    let total = participations.len();
    Ok(Json(ListParticipationsResponse {
        participations,
        total,
    }))
}

/// POST /api/v1/participations/:participation_id/approve
///
/// Host approval; the participation becomes CONFIRMED and consumes a slot.
pub async fn approve_participation(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    Path(participation_id): Path<Uuid>,
) -> Result<Json<ParticipationResponse>, ApiError> {
    let approved = state
        .participation_service
        .approve(participation_id, user_id)
        .await?;
    Ok(Json(approved.into()))
}

/// POST /api/v1/participations/:participation_id/reject
///
/// Host rejection; terminal, never touches the slot count.
pub async fn reject_participation(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    Path(participation_id): Path<Uuid>,
) -> Result<Json<ParticipationResponse>, ApiError> {
    let rejected = state
        .participation_service
        .reject(participation_id, user_id)
        .await?;
    Ok(Json(rejected.into()))
}

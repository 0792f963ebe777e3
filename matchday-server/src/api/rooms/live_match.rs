use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use kanau::processor::Processor;
use matchday_core::entities::room_live_match::{
    ActivateLiveMatch, DeactivateLiveMatch, DeleteLiveMatch, GetActiveLiveMatch,
};
use matchday_sdk::objects::{ActivateLiveMatchRequest, LiveMatchResponse};
use uuid::Uuid;

use super::RoomApiError;
use crate::api::extractors::ServiceAuth;
use crate::state::AppState;

/// `GET /rooms/{room_id}/live-match` — the room's active association.
pub(super) async fn get_live_match(
    state: State<AppState>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<LiveMatchResponse>, RoomApiError> {
    let row = state
        .processor()
        .process(GetActiveLiveMatch { room_id })
        .await
        .map_err(RoomApiError::Database)?
        .ok_or(RoomApiError::NotFound)?;
    Ok(Json((&row).into()))
}

/// `POST /rooms/{room_id}/live-match` — make `fixture` the room's active
/// match, replacing whatever was active before.
pub(super) async fn activate_live_match(
    state: State<AppState>,
    _auth: ServiceAuth,
    Path(room_id): Path<Uuid>,
    Json(body): Json<ActivateLiveMatchRequest>,
) -> Result<impl IntoResponse, RoomApiError> {
    if body.update_interval_minutes.is_some_and(|m| m < 1) {
        return Err(RoomApiError::InvalidInterval);
    }
    let match_id = body.fixture.id;
    let row = state
        .processor()
        .process(ActivateLiveMatch {
            room_id,
            fixture: body.fixture,
            activated_by: body.activated_by,
            update_interval_minutes: body.update_interval_minutes,
        })
        .await
        .map_err(RoomApiError::Database)?;

    tracing::info!(%room_id, match_id, "Live match activated");
    Ok((StatusCode::CREATED, Json(LiveMatchResponse::from(&row))))
}

/// `POST /rooms/{room_id}/live-match/stop` — deactivate without deleting.
pub(super) async fn stop_live_match(
    state: State<AppState>,
    _auth: ServiceAuth,
    Path(room_id): Path<Uuid>,
) -> Result<StatusCode, RoomApiError> {
    let updated = state
        .processor()
        .process(DeactivateLiveMatch { room_id })
        .await
        .map_err(RoomApiError::Database)?;
    if updated == 0 {
        return Err(RoomApiError::NotFound);
    }
    tracing::info!(%room_id, "Live match stopped");
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /rooms/{room_id}/live-match` — remove the room's associations.
pub(super) async fn delete_live_match(
    state: State<AppState>,
    _auth: ServiceAuth,
    Path(room_id): Path<Uuid>,
) -> Result<StatusCode, RoomApiError> {
    let deleted = state
        .processor()
        .process(DeleteLiveMatch { room_id })
        .await
        .map_err(RoomApiError::Database)?;
    if deleted == 0 {
        return Err(RoomApiError::NotFound);
    }
    tracing::info!(%room_id, deleted, "Live match removed");
    Ok(StatusCode::NO_CONTENT)
}

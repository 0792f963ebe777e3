//! Room live-match handlers.
//!
//! Mutations are moderator actions and require the
//! `Matchday-Service-Authorization` header.
//!
//! # Endpoints
//!
//! - `GET    /rooms/{room_id}/live-match`      – current active association
//! - `POST   /rooms/{room_id}/live-match`      – activate a match
//! - `POST   /rooms/{room_id}/live-match/stop` – deactivate
//! - `DELETE /rooms/{room_id}/live-match`      – delete the association
//! - `GET    /rooms/{room_id}/live-match/ws`   – live room view

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::state::AppState;

mod live_match;
mod ws;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/rooms/{room_id}/live-match",
            get(live_match::get_live_match)
                .post(live_match::activate_live_match)
                .delete(live_match::delete_live_match),
        )
        .route(
            "/rooms/{room_id}/live-match/stop",
            post(live_match::stop_live_match),
        )
        .route("/rooms/{room_id}/live-match/ws", get(ws::live_match_ws))
}

/// Errors that can occur in room handlers.
#[derive(Debug)]
pub(crate) enum RoomApiError {
    Database(sqlx::Error),
    NotFound,
    InvalidInterval,
}

impl IntoResponse for RoomApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            RoomApiError::Database(e) => {
                tracing::error!(error = %e, "Room API database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            RoomApiError::NotFound => {
                (StatusCode::NOT_FOUND, "no active live match").into_response()
            }
            RoomApiError::InvalidInterval => (
                StatusCode::BAD_REQUEST,
                "update_interval_minutes must be at least 1",
            )
                .into_response(),
        }
    }
}

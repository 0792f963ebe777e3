//! Store webhook handlers.
//!
//! # Endpoints
//!
//! - `POST /hooks/notification-inserted` – fan a new notification out to
//!   the user's push subscriptions

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use matchday_core::processors::DispatchError;
use matchday_sdk::objects::{DispatchAck, NotificationInsertedHook};

use crate::api::extractors::{HookBody, HookBodyError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/hooks/notification-inserted", post(notification_inserted))
}

/// `POST /hooks/notification-inserted` — deliver one notification.
///
/// Answers once every delivery attempt has finished, with per-outcome
/// counts. Without a `[push]` section every call fails the same way,
/// whatever the body holds.
async fn notification_inserted(
    state: State<AppState>,
    body: Result<HookBody<NotificationInsertedHook>, HookBodyError>,
) -> Result<Json<DispatchAck>, HookError> {
    let push = state.push().await.ok_or(HookError::PushNotConfigured)?;
    let HookBody(hook) = body.map_err(HookError::Body)?;
    let Some(user_id) = hook.record.user_id else {
        return Err(HookError::MissingUserId);
    };

    let report = push
        .dispatcher
        .dispatch(&hook.record)
        .await
        .map_err(HookError::Dispatch)?;
    tracing::info!(
        %user_id,
        delivered = report.delivered,
        pruned = report.pruned,
        failed = report.failed,
        "Notification dispatched"
    );
    Ok(Json(report.into()))
}

#[derive(Debug)]
enum HookError {
    Body(HookBodyError),
    MissingUserId,
    PushNotConfigured,
    Dispatch(DispatchError),
}

impl IntoResponse for HookError {
    fn into_response(self) -> axum::response::Response {
        match self {
            HookError::Body(e) => e.into_response(),
            HookError::MissingUserId | HookError::Dispatch(DispatchError::MissingUserId) => {
                (StatusCode::BAD_REQUEST, "record.user_id is required").into_response()
            }
            HookError::PushNotConfigured => {
                tracing::error!("Notification webhook called but push is not configured");
                (StatusCode::INTERNAL_SERVER_ERROR, "push is not configured").into_response()
            }
            HookError::Dispatch(e) => {
                tracing::error!(error = %e, "Notification dispatch failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}

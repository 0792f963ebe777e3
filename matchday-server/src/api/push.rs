//! Push subscription handlers.
//!
//! # Endpoints
//!
//! - `GET    /push/vapid-public-key`             – application server key
//! - `POST   /users/{user_id}/push-subscriptions` – register a device
//! - `DELETE /users/{user_id}/push-subscriptions` – unregister a device

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use kanau::processor::Processor;
use matchday_core::entities::push_subscription::{
    DeleteSubscriptionByEndpoint, InsertSubscriptionIfAbsent,
};
use matchday_sdk::objects::{
    PushSubscriptionDescriptor, UnsubscribeRequest, VapidPublicKeyResponse,
};
use matchday_sdk::webpush::{PushTarget, WebPushError};
use uuid::Uuid;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/push/vapid-public-key", get(vapid_public_key))
        .route(
            "/users/{user_id}/push-subscriptions",
            post(subscribe).delete(unsubscribe),
        )
}

/// `GET /push/vapid-public-key`
async fn vapid_public_key(
    state: State<AppState>,
) -> Result<Json<VapidPublicKeyResponse>, PushApiError> {
    let push = state.push().await.ok_or(PushApiError::NotConfigured)?;
    Ok(Json(VapidPublicKeyResponse {
        public_key: push.public_key,
    }))
}

/// `POST /users/{user_id}/push-subscriptions` — store the browser's
/// subscription unless this device is already registered.
///
/// 201 when stored, 200 when it already existed.
async fn subscribe(
    state: State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(descriptor): Json<PushSubscriptionDescriptor>,
) -> Result<StatusCode, PushApiError> {
    PushTarget::from_descriptor(&descriptor).map_err(PushApiError::InvalidSubscription)?;

    let inserted = state
        .processor()
        .process(InsertSubscriptionIfAbsent {
            user_id,
            descriptor,
        })
        .await
        .map_err(PushApiError::Database)?;

    if inserted {
        tracing::info!(%user_id, "Push subscription stored");
        Ok(StatusCode::CREATED)
    } else {
        Ok(StatusCode::OK)
    }
}

/// `DELETE /users/{user_id}/push-subscriptions`
async fn unsubscribe(
    state: State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<UnsubscribeRequest>,
) -> Result<StatusCode, PushApiError> {
    let deleted = state
        .processor()
        .process(DeleteSubscriptionByEndpoint {
            user_id,
            endpoint: body.endpoint,
        })
        .await
        .map_err(PushApiError::Database)?;
    if deleted == 0 {
        return Err(PushApiError::NotFound);
    }
    tracing::info!(%user_id, "Push subscription removed");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug)]
enum PushApiError {
    Database(sqlx::Error),
    NotConfigured,
    NotFound,
    InvalidSubscription(WebPushError),
}

impl IntoResponse for PushApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            PushApiError::Database(e) => {
                tracing::error!(error = %e, "Push API database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            PushApiError::NotConfigured => {
                (StatusCode::INTERNAL_SERVER_ERROR, "push is not configured").into_response()
            }
            PushApiError::NotFound => {
                (StatusCode::NOT_FOUND, "subscription not found").into_response()
            }
            PushApiError::InvalidSubscription(e) => {
                (StatusCode::BAD_REQUEST, format!("invalid subscription: {e}")).into_response()
            }
        }
    }
}

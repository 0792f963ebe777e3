//! Notification handlers.
//!
//! # Endpoints
//!
//! - `GET  /users/{user_id}/notifications`              – list (limit/offset)
//! - `GET  /users/{user_id}/notifications/unread-count` – unread count
//! - `POST /users/{user_id}/notifications/read-all`     – mark all read
//! - `POST /notifications/{id}/read`                    – mark one read
//! - `GET  /users/{user_id}/notifications/ws`           – realtime stream
//!
//! `chat_room` notifications are always presented as read.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use kanau::processor::Processor;
use matchday_core::entities::notification::{
    CountUnreadNotifications, ListNotifications, MarkAllNotificationsRead, MarkNotificationRead,
};
use matchday_sdk::objects::{
    NotificationResponse, PageQuery, UnreadCountResponse, clamp_pagination,
};
use uuid::Uuid;

use crate::state::AppState;

mod ws;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{user_id}/notifications", get(list_notifications))
        .route(
            "/users/{user_id}/notifications/unread-count",
            get(unread_count),
        )
        .route(
            "/users/{user_id}/notifications/read-all",
            post(mark_all_read),
        )
        .route("/users/{user_id}/notifications/ws", get(ws::notifications_ws))
        .route("/notifications/{id}/read", post(mark_read))
}

/// `GET /users/{user_id}/notifications` — newest first.
async fn list_notifications(
    state: State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<NotificationResponse>>, NotificationApiError> {
    let (limit, offset) = clamp_pagination(page.limit, page.offset);
    let rows = state
        .processor()
        .process(ListNotifications {
            user_id,
            limit,
            offset,
        })
        .await
        .map_err(NotificationApiError::Database)?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// `GET /users/{user_id}/notifications/unread-count`
async fn unread_count(
    state: State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UnreadCountResponse>, NotificationApiError> {
    let count = state
        .processor()
        .process(CountUnreadNotifications { user_id })
        .await
        .map_err(NotificationApiError::Database)?;
    Ok(Json(UnreadCountResponse { count }))
}

/// `POST /users/{user_id}/notifications/read-all`
async fn mark_all_read(
    state: State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, NotificationApiError> {
    let updated = state
        .processor()
        .process(MarkAllNotificationsRead { user_id })
        .await
        .map_err(NotificationApiError::Database)?;
    tracing::debug!(%user_id, updated, "Notifications marked read");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /notifications/{id}/read`
async fn mark_read(
    state: State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NotificationResponse>, NotificationApiError> {
    let row = state
        .processor()
        .process(MarkNotificationRead { id })
        .await
        .map_err(NotificationApiError::Database)?
        .ok_or(NotificationApiError::NotFound)?;
    Ok(Json(row.into()))
}

#[derive(Debug)]
enum NotificationApiError {
    Database(sqlx::Error),
    NotFound,
}

impl IntoResponse for NotificationApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            NotificationApiError::Database(e) => {
                tracing::error!(error = %e, "Notification API database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            NotificationApiError::NotFound => {
                (StatusCode::NOT_FOUND, "notification not found").into_response()
            }
        }
    }
}

use axum::{
    extract::{
        Path, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use matchday_core::events::NotificationChange;
use matchday_sdk::objects::{NotificationMessage, WsCloseCode};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use uuid::Uuid;

use crate::api::send_json;
use crate::state::AppState;

/// `GET /users/{user_id}/notifications/ws` — the user's notification
/// inserts and updates as they happen. A `resync` frame means changes
/// were dropped and the client should refetch.
pub(super) async fn notifications_ws(
    state: State<AppState>,
    Path(user_id): Path<Uuid>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let app_state = state.0.clone();
    ws.on_upgrade(move |socket| handle_notifications_ws(socket, app_state, user_id))
}

/// The frame a change produces for `user_id`, if any.
fn to_message(change: NotificationChange, user_id: Uuid) -> Option<NotificationMessage> {
    if change.user_id().is_some_and(|owner| owner != user_id) {
        return None;
    }
    match change {
        NotificationChange::Created(row) => Some(NotificationMessage::Created {
            notification: row.into(),
        }),
        NotificationChange::Updated(row) => Some(NotificationMessage::Updated {
            notification: row.into(),
        }),
        NotificationChange::Deleted { .. } => None,
        NotificationChange::Resync => Some(NotificationMessage::Resync),
    }
}

/// The frame one broadcast item produces. Lost items turn into `resync`.
fn to_frame(
    item: Result<NotificationChange, BroadcastStreamRecvError>,
    user_id: Uuid,
) -> Option<NotificationMessage> {
    match item {
        Ok(change) => to_message(change, user_id),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(%user_id, skipped, "WS: notification stream lagged, asking client to resync");
            Some(NotificationMessage::Resync)
        }
    }
}

async fn handle_notifications_ws(mut socket: WebSocket, state: AppState, user_id: Uuid) {
    let mut changes = BroadcastStream::new(state.changes.notification.subscribe());

    loop {
        tokio::select! {
            change = changes.next() => {
                match change {
                    Some(item) => {
                        let Some(message) = to_frame(item, user_id) else {
                            continue;
                        };
                        if send_json(&mut socket, &message).await.is_err() {
                            return;
                        }
                    }
                    None => {
                        let _ = socket
                            .send(Message::Close(Some(CloseFrame {
                                code: WsCloseCode::INTERNAL_ERROR,
                                reason: "notification stream closed".into(),
                            })))
                            .await;
                        return;
                    }
                }
            }

            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

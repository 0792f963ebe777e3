use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use matchday_core::processors::{MatchPoller, RoomSession};
use uuid::Uuid;

use crate::api::send_json;
use crate::state::AppState;

/// `GET /rooms/{room_id}/live-match/ws` — one live room view.
///
/// The first frame is the room's current state; every applied change
/// follows as another frame. Closing the socket ends the view's session,
/// its poll interval and its change subscription.
pub(super) async fn live_match_ws(
    state: State<AppState>,
    Path(room_id): Path<Uuid>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let app_state = state.0.clone();
    ws.on_upgrade(move |socket| handle_room_ws(socket, app_state, room_id))
}

async fn handle_room_ws(mut socket: WebSocket, state: AppState, room_id: Uuid) {
    let store = state.live_match_store();
    let poller = MatchPoller::new(state.provider().await, store.clone());
    let default_refresh_minutes = state.config.football.read().await.default_refresh_minutes;

    // The change receiver is taken before the session reads the row, so
    // nothing written in between is lost.
    let mut session = RoomSession::new(
        room_id,
        poller,
        store,
        state.changes.live_match.subscribe(),
        default_refresh_minutes,
    )
    .spawn();
    tracing::debug!(%room_id, "WS: room view opened");

    loop {
        tokio::select! {
            outgoing = session.recv() => {
                match outgoing {
                    Some(message) => {
                        if send_json(&mut socket, &message).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            // Incoming WebSocket frame from the client (ping/pong/close)
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    session.stop().await;
    let _ = socket.send(Message::Close(None)).await;
    tracing::debug!(%room_id, "WS: room view closed");
}

//! HTTP and WebSocket API.
//!
//! - [`hooks`]: store webhooks (notification fan-out)
//! - [`fixtures`]: match data provider proxy
//! - [`rooms`]: room live-match association and live room views
//! - [`push`]: push subscription management
//! - [`notifications`]: notification inbox and realtime stream

use axum::{
    Router,
    extract::ws::{Message, WebSocket},
};

use crate::state::AppState;

pub mod extractors;
mod fixtures;
mod hooks;
mod notifications;
mod push;
mod rooms;

/// All API routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(hooks::router())
        .merge(fixtures::router())
        .merge(rooms::router())
        .merge(push::router())
        .merge(notifications::router())
}

/// Serialize `value` as JSON and send it as a text WebSocket frame.
///
/// Returns `Err(())` if the send fails (client disconnected).
pub(crate) async fn send_json<T: serde::Serialize>(
    socket: &mut WebSocket,
    value: &T,
) -> Result<(), ()> {
    let json = serde_json::to_string(value).map_err(|_| ())?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}

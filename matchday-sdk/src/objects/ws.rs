//! WebSocket message types for the room live-match and notification
//! streams.
//!
//! # Room protocol (`GET /rooms/{room_id}/live-match/ws`)
//!
//! 1. Right after the upgrade the server sends the room's current state:
//!    a [`LiveMatchMessage::Snapshot`] or [`LiveMatchMessage::Cleared`].
//! 2. Every later change (poll refresh, activation, deactivation) is sent
//!    as another `Snapshot` or `Cleared` frame.
//! 3. The stream stays open until the client disconnects.

use serde::{Deserialize, Serialize};

use super::live_match::LiveMatchResponse;
use super::notification::NotificationResponse;

/// Server-to-client message of a room view.
///
/// ```json
/// {"type":"snapshot","live_match":{ ... }}
/// {"type":"cleared"}
/// {"type":"error","code":1011,"reason":"internal error"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveMatchMessage {
    /// The room's active live match.
    Snapshot { live_match: LiveMatchResponse },
    /// The room has no active live match.
    Cleared,
    /// A server-side error.
    Error { code: u16, reason: String },
}

/// Server-to-client message of a user's notification stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationMessage {
    /// A notification was inserted.
    Created { notification: NotificationResponse },
    /// A notification changed (e.g. marked read).
    Updated { notification: NotificationResponse },
    /// Some changes were not delivered; refetch the list over HTTP.
    Resync,
}

/// Well-known WebSocket close codes.
pub struct WsCloseCode;

impl WsCloseCode {
    /// Normal closure.
    pub const NORMAL: u16 = 1000;

    /// An unexpected server-side error prevented the connection from
    /// continuing.
    pub const INTERNAL_ERROR: u16 = 1011;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleared_is_tagged() {
        let json = serde_json::to_string(&LiveMatchMessage::Cleared).unwrap();
        assert_eq!(json, r#"{"type":"cleared"}"#);
    }

    #[test]
    fn resync_is_tagged() {
        let json = serde_json::to_string(&NotificationMessage::Resync).unwrap();
        assert_eq!(json, r#"{"type":"resync"}"#);
    }
}

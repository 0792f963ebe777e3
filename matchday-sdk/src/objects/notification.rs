//! Notification objects.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of event a notification represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Like,
    Comment,
    Follow,
    Message,
    Post,
    FollowerComment,
    ChatRoom,
    RoomInvitation,
    Verification,
    PostShare,
    /// A type this version does not know about yet.
    #[serde(other)]
    Other,
}

impl NotificationType {
    /// Whether a notification of this type is shown as read no matter what
    /// its stored flag says.
    ///
    /// Chat room activity is surfaced inside the room itself, so its
    /// notifications never count as unread.
    pub fn always_read(self) -> bool {
        matches!(self, NotificationType::ChatRoom)
    }

    /// The read flag a client should display.
    pub fn effective_is_read(self, stored: bool) -> bool {
        stored || self.always_read()
    }
}

/// A notification as returned to its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    /// Read flag after the presentation override.
    pub is_read: bool,
    /// Unix timestamp (milliseconds).
    pub created_at: i64,
}

/// Response of `GET /users/{user_id}/notifications/unread-count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

/// The JSON document delivered (encrypted) to every push endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_room_is_always_read() {
        assert!(NotificationType::ChatRoom.effective_is_read(false));
        assert!(!NotificationType::Like.effective_is_read(false));
        assert!(NotificationType::Like.effective_is_read(true));
    }

    #[test]
    fn unknown_type_deserializes_as_other() {
        let t: NotificationType = serde_json::from_str("\"match_goal\"").unwrap();
        assert_eq!(t, NotificationType::Other);
        let t: NotificationType = serde_json::from_str("\"follower_comment\"").unwrap();
        assert_eq!(t, NotificationType::FollowerComment);
    }
}

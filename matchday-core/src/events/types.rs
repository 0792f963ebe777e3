//! Change event types.
//!
//! Triggers publish only the keys of a changed row (see the `*Notice`
//! types). The listener reads the row back and broadcasts one of the
//! `*Change` enums, so payload size never depends on row contents.

use crate::entities::{Notification, RoomLiveMatch};
use serde::Deserialize;
use uuid::Uuid;

/// Row operation reported by the trigger (`TG_OP`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

/// Payload on the live match channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LiveMatchNotice {
    pub op: ChangeOp,
    pub id: i64,
    pub room_id: Uuid,
    /// `false` for deletes.
    pub is_active: bool,
}

/// Payload on the notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NotificationNotice {
    pub op: ChangeOp,
    pub id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiveMatchChange {
    /// An active row as read back after an insert or update.
    Active(RoomLiveMatch),
    /// The row was deleted or deactivated.
    Inactive { id: i64, room_id: Uuid },
    /// The listener reconnected and may have missed changes for any room.
    Resync,
}

impl LiveMatchChange {
    /// `None` for [`LiveMatchChange::Resync`], which concerns every room.
    pub fn room_id(&self) -> Option<Uuid> {
        match self {
            LiveMatchChange::Active(row) => Some(row.room_id),
            LiveMatchChange::Inactive { room_id, .. } => Some(*room_id),
            LiveMatchChange::Resync => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationChange {
    Created(Notification),
    Updated(Notification),
    Deleted { id: Uuid, user_id: Uuid },
    /// The listener reconnected and may have missed changes for any user.
    Resync,
}

impl NotificationChange {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            NotificationChange::Created(n) | NotificationChange::Updated(n) => Some(n.user_id),
            NotificationChange::Deleted { user_id, .. } => Some(*user_id),
            NotificationChange::Resync => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_carry_keys_only() {
        let notice: LiveMatchNotice = serde_json::from_str(
            r#"{"op":"UPDATE","id":7,"room_id":"8d0f3c1e-2f7a-4a55-9a0b-5f4b8c2d1e33","is_active":false}"#,
        )
        .unwrap();
        assert_eq!(notice.op, ChangeOp::Update);
        assert_eq!(notice.id, 7);
        assert!(!notice.is_active);

        let notice: NotificationNotice = serde_json::from_str(
            r#"{"op":"DELETE","id":"0b4c6c2e-3f54-4c4b-9a7e-8a3d3b0c1f11",
                "user_id":"6f1e8a44-9a4c-4d0e-bb3f-0c7a2f6f9d21"}"#,
        )
        .unwrap();
        assert_eq!(notice.op, ChangeOp::Delete);
        assert_eq!(
            notice.user_id.to_string(),
            "6f1e8a44-9a4c-4d0e-bb3f-0c7a2f6f9d21"
        );
    }

    #[test]
    fn notice_without_key_is_rejected() {
        // notification ids are uuids
        assert!(
            serde_json::from_str::<NotificationNotice>(
                r#"{"op":"INSERT","id":3,"user_id":"6f1e8a44-9a4c-4d0e-bb3f-0c7a2f6f9d21"}"#
            )
            .is_err()
        );
        assert!(serde_json::from_str::<LiveMatchNotice>(r#"{"op":"INSERT","id":3}"#).is_err());
    }

    #[test]
    fn resync_belongs_to_no_room_or_user() {
        assert_eq!(LiveMatchChange::Resync.room_id(), None);
        assert_eq!(NotificationChange::Resync.user_id(), None);
        let room = Uuid::new_v4();
        assert_eq!(
            LiveMatchChange::Inactive { id: 1, room_id: room }.room_id(),
            Some(room)
        );
    }
}

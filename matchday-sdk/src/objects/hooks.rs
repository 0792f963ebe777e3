//! Webhook bodies sent by the persistent store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Signature;
use super::notification::NotificationType;

/// Body of the `notification inserted` database webhook.
///
/// Only `record` is interpreted; the remaining envelope fields are kept
/// for logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationInsertedHook {
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
    pub record: NotificationRecord,
}

impl Signature for NotificationInsertedHook {}

/// The inserted notification row.
///
/// `user_id` is optional at the wire level so that a missing target can be
/// rejected with a validation error instead of a parse error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(rename = "type", default)]
    pub notification_type: Option<NotificationType>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Acknowledgement returned to the webhook caller once every delivery
/// attempt has finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchAck {
    pub success: bool,
    pub delivered: u32,
    pub pruned: u32,
    pub failed: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_store_webhook_envelope() {
        let json = r#"{
            "type": "INSERT",
            "table": "notifications",
            "schema": "public",
            "record": {
                "id": "0b4c6c2e-3f54-4c4b-9a7e-8a3d3b0c1f11",
                "user_id": "6f1e8a44-9a4c-4d0e-bb3f-0c7a2f6f9d21",
                "type": "comment",
                "title": "New comment",
                "message": "Someone replied to your post",
                "data": { "post_id": "p1" },
                "is_read": false,
                "created_at": "2024-05-01T10:00:00.000Z"
            },
            "old_record": null
        }"#;
        let hook: NotificationInsertedHook = serde_json::from_str(json).unwrap();
        assert_eq!(hook.event_type.as_deref(), Some("INSERT"));
        assert!(hook.record.user_id.is_some());
        assert_eq!(hook.record.notification_type, Some(NotificationType::Comment));
        assert_eq!(hook.record.data["post_id"], "p1");
    }

    #[test]
    fn missing_user_id_still_parses() {
        let json = r#"{ "record": { "title": "t", "message": "m" } }"#;
        let hook: NotificationInsertedHook = serde_json::from_str(json).unwrap();
        assert_eq!(hook.record.user_id, None);
        assert!(hook.record.data.is_null());
    }
}

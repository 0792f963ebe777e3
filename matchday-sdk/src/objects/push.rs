//! Browser push subscription descriptors.

use serde::{Deserialize, Serialize};

/// Encryption keys of a push subscription, base64url encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscriptionKeys {
    /// Uncompressed P-256 public key of the user agent (65 bytes).
    pub p256dh: String,
    /// Authentication secret (16 bytes).
    pub auth: String,
}

/// A push subscription as serialized by the browser's
/// `PushSubscription.toJSON()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscriptionDescriptor {
    pub endpoint: String,
    #[serde(default)]
    pub expiration_time: Option<i64>,
    pub keys: PushSubscriptionKeys,
}

/// Request body for `DELETE /users/{user_id}/push-subscriptions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsubscribeRequest {
    pub endpoint: String,
}

/// Response of `GET /push/vapid-public-key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VapidPublicKeyResponse {
    pub public_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_browser_subscription_json() {
        let json = r#"{
            "endpoint": "https://fcm.googleapis.com/fcm/send/abc",
            "expirationTime": null,
            "keys": { "p256dh": "BNcR", "auth": "tBHI" }
        }"#;
        let sub: PushSubscriptionDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(sub.endpoint, "https://fcm.googleapis.com/fcm/send/abc");
        assert_eq!(sub.expiration_time, None);
        assert_eq!(sub.keys.auth, "tBHI");
    }
}

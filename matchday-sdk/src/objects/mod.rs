pub mod fixtures;
pub mod hooks;
pub mod live_match;
pub mod notification;
pub mod push;
pub mod ws;

pub use fixtures::{Fixture, FixtureQuery, MatchStatus};
pub use hooks::{DispatchAck, NotificationInsertedHook, NotificationRecord};
pub use live_match::{ActivateLiveMatchRequest, LiveMatchResponse};
pub use notification::{NotificationResponse, NotificationType, PushMessage, UnreadCountResponse};
pub use push::{
    PushSubscriptionDescriptor, PushSubscriptionKeys, UnsubscribeRequest, VapidPublicKeyResponse,
};
pub use ws::{LiveMatchMessage, NotificationMessage, WsCloseCode};

/// Marker trait for types that can participate in body signing via
/// [`SignedObject`](crate::signature::SignedObject).
pub trait Signature: for<'de> serde::Deserialize<'de> + serde::Serialize {}

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 200;
const MAX_OFFSET: i64 = 100_000;

/// Query parameters for paginated listings.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Clamp limit and offset to safe maximums.
pub fn clamp_pagination(limit: i64, offset: i64) -> (i64, i64) {
    (limit.clamp(1, MAX_LIMIT), offset.clamp(0, MAX_OFFSET))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_clamped() {
        assert_eq!(clamp_pagination(0, -5), (1, 0));
        assert_eq!(clamp_pagination(50, 10), (50, 10));
        assert_eq!(clamp_pagination(10_000, 1_000_000), (MAX_LIMIT, MAX_OFFSET));
    }
}

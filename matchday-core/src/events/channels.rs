//! Broadcast channel factories for row change events.

use super::types::{LiveMatchChange, NotificationChange};
use tokio::sync::broadcast;

/// Buffer of each broadcast channel. Receivers that fall further behind
/// see `RecvError::Lagged` and resynchronize from the store.
pub const DEFAULT_BROADCAST_BUFFER: usize = 256;

pub type LiveMatchChangeSender = broadcast::Sender<LiveMatchChange>;
pub type LiveMatchChangeReceiver = broadcast::Receiver<LiveMatchChange>;

pub type NotificationChangeSender = broadcast::Sender<NotificationChange>;
pub type NotificationChangeReceiver = broadcast::Receiver<NotificationChange>;

pub fn live_match_change_channel() -> (LiveMatchChangeSender, LiveMatchChangeReceiver) {
    broadcast::channel(DEFAULT_BROADCAST_BUFFER)
}

pub fn notification_change_channel() -> (NotificationChangeSender, NotificationChangeReceiver) {
    broadcast::channel(DEFAULT_BROADCAST_BUFFER)
}

/// Senders for every change stream, handed to the `ChangeListener`.
///
/// New subscribers call `subscribe()` on the sender they need.
#[derive(Clone)]
pub struct ChangeSenders {
    pub live_match: LiveMatchChangeSender,
    pub notification: NotificationChangeSender,
}

impl ChangeSenders {
    pub fn new() -> Self {
        let (live_match, _) = live_match_change_channel();
        let (notification, _) = notification_change_channel();
        Self {
            live_match,
            notification,
        }
    }
}

impl Default for ChangeSenders {
    fn default() -> Self {
        Self::new()
    }
}

//! Row change events.
//!
//! Database triggers publish every insert, update and delete of
//! `room_live_matches` and `notifications` as a small key-only JSON notice
//! on a Postgres channel. The `ChangeListener` reads the affected row back,
//! turns it into one of the change types below and fans it out on
//! broadcast channels; every open room or notification stream holds one
//! receiver and filters by its own key.

pub mod channels;
pub mod types;

pub use channels::{
    ChangeSenders, DEFAULT_BROADCAST_BUFFER, LiveMatchChangeReceiver, LiveMatchChangeSender,
    NotificationChangeReceiver, NotificationChangeSender, live_match_change_channel,
    notification_change_channel,
};

pub use types::{
    ChangeOp, LiveMatchChange, LiveMatchNotice, NotificationChange, NotificationNotice,
};

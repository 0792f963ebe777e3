pub mod notification;
pub mod push_subscription;
pub mod room_live_match;

pub use notification::Notification;
pub use push_subscription::PushSubscription;
pub use room_live_match::RoomLiveMatch;

/// Truncate a timestamp to the microsecond precision Postgres stores, so
/// values written and read back compare equal.
pub fn db_timestamp(at: time::OffsetDateTime) -> time::OffsetDateTime {
    at.replace_nanosecond(at.nanosecond() / 1_000 * 1_000)
        .unwrap_or(at)
}

/// Milliseconds since the Unix epoch, as carried by wire objects.
pub fn unix_millis(at: time::OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

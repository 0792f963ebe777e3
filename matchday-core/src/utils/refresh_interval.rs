use std::time::Duration;

/// Refresh period for a live match.
///
/// Uses the row's `update_interval_minutes` when present, otherwise
/// `default_minutes`; the result is never shorter than one minute.
pub fn refresh_interval(row_minutes: Option<i32>, default_minutes: u32) -> Duration {
    let minutes = match row_minutes {
        Some(m) if m > 0 => m as u64,
        Some(_) => 1,
        None => default_minutes.max(1) as u64,
    };
    Duration::from_secs(minutes * 60)
}

/// Next timestamp for a locally produced write: now, but strictly after
/// `last` so ordering by `updated_at` stays monotonic.
pub fn next_write_timestamp(
    last: Option<time::OffsetDateTime>,
    now: time::OffsetDateTime,
) -> time::OffsetDateTime {
    let now = crate::entities::db_timestamp(now);
    match last {
        Some(last) if now <= last => last + time::Duration::microseconds(1),
        _ => now,
    }
}

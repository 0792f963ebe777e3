//! LiveMatchView reducer.
//!
//! A room view shows at most one live-match row. Two independent sources
//! write to it: the match poller and the row change stream. Both go
//! through [`LiveMatchView::apply`], which decides whether an update is
//! newer than what is shown:
//!
//! - a row with a different id (a newly activated match) always replaces
//!   the view;
//! - the same row is replaced only by a strictly newer `updated_at`, so
//!   the poller's own write echoing back through the change stream is
//!   discarded;
//! - a poll result applies only while the view shows that match;
//! - a delete or deactivation clears the view only if it names the shown
//!   row.

use crate::entities::RoomLiveMatch;
use crate::events::LiveMatchChange;
use crate::utils::refresh_interval::refresh_interval;
use matchday_sdk::objects::{Fixture, LiveMatchMessage, MatchStatus};
use sqlx::types::Json;
use std::time::Duration;

/// One write to the view.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    /// Authoritative read from the store (mount or resync).
    Loaded(Option<RoomLiveMatch>),
    /// An active row was inserted or updated.
    Upserted(RoomLiveMatch),
    /// The row was deleted or deactivated.
    Removed { id: i64 },
    /// The poller fetched a fresh snapshot for `match_id`.
    Polled {
        match_id: i64,
        fixture: Fixture,
        at: time::OffsetDateTime,
    },
}

impl ViewUpdate {
    /// Translate a row change into a view update.
    ///
    /// Returns `None` for [`LiveMatchChange::Resync`]; the owner reloads
    /// from the store instead.
    pub fn from_change(change: &LiveMatchChange) -> Option<Self> {
        match change {
            LiveMatchChange::Active(row) => Some(ViewUpdate::Upserted(row.clone())),
            LiveMatchChange::Inactive { id, .. } => Some(ViewUpdate::Removed { id: *id }),
            LiveMatchChange::Resync => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveMatchView {
    current: Option<RoomLiveMatch>,
}

impl LiveMatchView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&RoomLiveMatch> {
        self.current.as_ref()
    }

    /// The match id the poller should look for.
    pub fn tracked_match(&self) -> Option<i64> {
        self.current.as_ref().map(|r| r.match_id)
    }

    pub fn updated_at(&self) -> Option<time::OffsetDateTime> {
        self.current.as_ref().map(|r| r.updated_at)
    }

    /// Polling happens only while the shown match is live.
    pub fn is_polling(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|r| r.status() == MatchStatus::Live)
    }

    pub fn refresh_interval(&self, default_minutes: u32) -> Duration {
        refresh_interval(
            self.current.as_ref().and_then(|r| r.update_interval_minutes),
            default_minutes,
        )
    }

    /// Apply an update. Returns `true` if the shown state changed.
    pub fn apply(&mut self, update: ViewUpdate) -> bool {
        match update {
            ViewUpdate::Loaded(row) => {
                if self.current == row {
                    return false;
                }
                self.current = row;
                true
            }
            ViewUpdate::Upserted(row) => match &self.current {
                Some(shown) if shown.id == row.id && row.updated_at <= shown.updated_at => false,
                _ => {
                    self.current = Some(row);
                    true
                }
            },
            ViewUpdate::Removed { id } => {
                if self.current.as_ref().is_some_and(|r| r.id == id) {
                    self.current = None;
                    true
                } else {
                    false
                }
            }
            ViewUpdate::Polled {
                match_id,
                fixture,
                at,
            } => {
                let Some(shown) = self.current.as_mut() else {
                    return false;
                };
                if shown.match_id != match_id || at <= shown.updated_at {
                    return false;
                }
                shown.match_data = Json(fixture);
                shown.updated_at = at;
                true
            }
        }
    }

    /// The message describing the current state to a client.
    pub fn message(&self) -> LiveMatchMessage {
        match &self.current {
            Some(row) => LiveMatchMessage::Snapshot {
                live_match: row.into(),
            },
            None => LiveMatchMessage::Cleared,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use uuid::Uuid;

    pub(crate) fn fixture(id: i64, status: MatchStatus) -> Fixture {
        Fixture {
            id,
            home_team: "Al Ahly".into(),
            away_team: "Zamalek".into(),
            home_logo: None,
            away_logo: None,
            home_score: Some(0),
            away_score: Some(0),
            status,
            minute: Some(10),
            league: "Egyptian Premier League".into(),
            league_logo: None,
            kickoff: None,
        }
    }

    fn at(secs: i64) -> time::OffsetDateTime {
        time::OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(1_700_000_000 + secs)
    }

    pub(crate) fn row(id: i64, room_id: Uuid, match_id: i64, secs: i64) -> RoomLiveMatch {
        RoomLiveMatch {
            id,
            room_id,
            match_id,
            match_data: Json(fixture(match_id, MatchStatus::Live)),
            is_active: true,
            activated_by: None,
            update_interval_minutes: None,
            updated_at: at(secs),
        }
    }

    fn shown(row: RoomLiveMatch) -> LiveMatchView {
        let mut view = LiveMatchView::new();
        assert!(view.apply(ViewUpdate::Loaded(Some(row))));
        view
    }

    #[test]
    fn new_row_always_replaces() {
        let room = Uuid::new_v4();
        let mut view = shown(row(1, room, 100, 50));
        // older timestamp, but a different row
        assert!(view.apply(ViewUpdate::Upserted(row(2, room, 200, 10))));
        assert_eq!(view.tracked_match(), Some(200));
    }

    #[test]
    fn same_row_requires_newer_timestamp() {
        let room = Uuid::new_v4();
        let mut view = shown(row(1, room, 100, 50));
        assert!(!view.apply(ViewUpdate::Upserted(row(1, room, 100, 50))));
        assert!(!view.apply(ViewUpdate::Upserted(row(1, room, 100, 40))));
        assert!(view.apply(ViewUpdate::Upserted(row(1, room, 100, 60))));
        assert_eq!(view.updated_at(), Some(at(60)));
    }

    #[test]
    fn poll_echo_is_discarded() {
        let room = Uuid::new_v4();
        let mut view = shown(row(1, room, 100, 50));

        let mut polled = fixture(100, MatchStatus::Live);
        polled.home_score = Some(2);
        assert!(view.apply(ViewUpdate::Polled {
            match_id: 100,
            fixture: polled.clone(),
            at: at(70),
        }));

        // the persisted write comes back through the change stream
        let mut echo = row(1, room, 100, 70);
        echo.match_data = Json(polled);
        assert!(!view.apply(ViewUpdate::Upserted(echo)));

        // a stale listener event from before the poll is discarded too
        assert!(!view.apply(ViewUpdate::Upserted(row(1, room, 100, 65))));
        assert_eq!(view.current().unwrap().fixture().home_score, Some(2));
    }

    #[test]
    fn poll_for_other_match_is_ignored() {
        let room = Uuid::new_v4();
        let mut view = shown(row(1, room, 100, 50));
        assert!(!view.apply(ViewUpdate::Polled {
            match_id: 999,
            fixture: fixture(999, MatchStatus::Live),
            at: at(70),
        }));

        let mut empty = LiveMatchView::new();
        assert!(!empty.apply(ViewUpdate::Polled {
            match_id: 100,
            fixture: fixture(100, MatchStatus::Live),
            at: at(70),
        }));
        assert!(empty.current().is_none());
    }

    #[test]
    fn removal_only_clears_shown_row() {
        let room = Uuid::new_v4();
        let mut view = shown(row(2, room, 200, 50));
        assert!(!view.apply(ViewUpdate::Removed { id: 1 }));
        assert!(view.current().is_some());
        assert!(view.apply(ViewUpdate::Removed { id: 2 }));
        assert!(view.current().is_none());
        assert_eq!(view.message(), LiveMatchMessage::Cleared);
    }

    #[test]
    fn polling_follows_status_and_interval() {
        let room = Uuid::new_v4();
        let mut r = row(1, room, 100, 50);
        r.update_interval_minutes = Some(5);
        let mut view = shown(r);
        assert!(view.is_polling());
        assert_eq!(view.refresh_interval(2), Duration::from_secs(300));

        let mut finished = row(1, room, 100, 60);
        finished.match_data = Json(fixture(100, MatchStatus::Finished));
        view.apply(ViewUpdate::Upserted(finished));
        assert!(!view.is_polling());
        assert!(!LiveMatchView::new().is_polling());
    }

    #[test]
    fn changes_map_to_updates() {
        let room = Uuid::new_v4();
        let active = row(1, room, 100, 50);
        assert_eq!(
            ViewUpdate::from_change(&LiveMatchChange::Active(active.clone())),
            Some(ViewUpdate::Upserted(active))
        );
        assert_eq!(
            ViewUpdate::from_change(&LiveMatchChange::Inactive { id: 1, room_id: room }),
            Some(ViewUpdate::Removed { id: 1 })
        );
        assert_eq!(ViewUpdate::from_change(&LiveMatchChange::Resync), None);
    }
}

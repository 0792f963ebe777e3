//! RoomSession processor.
//!
//! A room session is one open view of a chat room's live match. It runs as
//! a single task that owns:
//! - the room's [`LiveMatchView`];
//! - one poll interval, armed only while the shown match is live;
//! - one receiver of the live-match change stream, filtered by room.
//!
//! Timer ticks and change events are handled one at a time on that task.
//! A lagged change stream, a resync marker from the listener, or a polled
//! snapshot that found no active row to write to all reload the room from
//! the store. Every applied state change is published on a `watch` channel
//! and as a [`LiveMatchMessage`] on an `mpsc` channel. Stopping the session (or
//! dropping its handle) ends the task, which drops the interval and the
//! change receiver with it.

use crate::events::{LiveMatchChange, LiveMatchChangeReceiver};
use crate::entities::RoomLiveMatch;
use crate::processors::live_match_view::{LiveMatchView, ViewUpdate};
use crate::processors::match_poller::{MatchPoller, PollOutcome};
use crate::store::LiveMatchStore;
use matchday_sdk::objects::LiveMatchMessage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Buffer of outgoing messages per session.
const MESSAGE_BUFFER: usize = 64;

pub struct RoomSession {
    room_id: Uuid,
    poller: MatchPoller,
    store: Arc<dyn LiveMatchStore>,
    changes: LiveMatchChangeReceiver,
    default_refresh_minutes: u32,
}

/// Owner side of a running [`RoomSession`].
pub struct RoomSessionHandle {
    state: watch::Receiver<Option<RoomLiveMatch>>,
    messages: mpsc::Receiver<LiveMatchMessage>,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RoomSessionHandle {
    /// Latest view state.
    pub fn state(&self) -> watch::Receiver<Option<RoomLiveMatch>> {
        self.state.clone()
    }

    /// Next outgoing message; `None` once the session has ended.
    pub async fn recv(&mut self) -> Option<LiveMatchMessage> {
        self.messages.recv().await
    }

    /// Stop the session and wait for its task to finish. No event changes
    /// the state after this returns.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.task.await;
    }
}

impl RoomSession {
    pub fn new(
        room_id: Uuid,
        poller: MatchPoller,
        store: Arc<dyn LiveMatchStore>,
        changes: LiveMatchChangeReceiver,
        default_refresh_minutes: u32,
    ) -> Self {
        Self {
            room_id,
            poller,
            store,
            changes,
            default_refresh_minutes,
        }
    }

    /// Spawn the session task.
    pub fn spawn(self) -> RoomSessionHandle {
        let (state_tx, state) = watch::channel(None);
        let (message_tx, messages) = mpsc::channel(MESSAGE_BUFFER);
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(state_tx, message_tx, stop_rx));
        RoomSessionHandle {
            state,
            messages,
            stop_tx,
            task,
        }
    }

    async fn run(
        mut self,
        state_tx: watch::Sender<Option<RoomLiveMatch>>,
        message_tx: mpsc::Sender<LiveMatchMessage>,
        mut stop_rx: watch::Receiver<bool>,
    ) {
        let room_id = self.room_id;
        debug!(%room_id, "RoomSession started");

        let mut view = LiveMatchView::new();
        match self.store.active_for_room(room_id).await {
            Ok(row) => {
                view.apply(ViewUpdate::Loaded(row));
            }
            Err(e) => {
                warn!(%room_id, error = %e, "Failed to load active live match");
                let _ = message_tx
                    .send(LiveMatchMessage::Error {
                        code: 500,
                        reason: "failed to load live match".into(),
                    })
                    .await;
            }
        }
        if !publish(&view, &state_tx, &message_tx).await {
            return;
        }

        let mut period = view.refresh_interval(self.default_refresh_minutes);
        let mut interval = new_interval(period);
        let mut tracked_row = view.current().map(|r| r.id);
        let mut changes_open = true;

        loop {
            let changed = tokio::select! {
                biased;

                res = stop_rx.changed() => {
                    if res.is_err() || *stop_rx.borrow() {
                        break;
                    }
                    false
                }

                change = self.changes.recv(), if changes_open => match change {
                    Ok(LiveMatchChange::Resync) => {
                        info!(%room_id, "Change listener reconnected, reloading");
                        self.reload(&mut view).await
                    }
                    Ok(change) if change.room_id() == Some(room_id) => {
                        ViewUpdate::from_change(&change).is_some_and(|u| view.apply(u))
                    }
                    Ok(_) => false,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(%room_id, skipped, "Change stream lagged, reloading");
                        self.reload(&mut view).await
                    }
                    Err(RecvError::Closed) => {
                        info!(%room_id, "Change stream closed, continuing with polling only");
                        changes_open = false;
                        false
                    }
                },

                _ = interval.tick(), if view.is_polling() => {
                    match self.poller.poll(room_id, &mut view).await {
                        PollOutcome::Updated { persisted: true } => true,
                        PollOutcome::Updated { persisted: false } => {
                            debug!(%room_id, "Polled snapshot was not stored, reloading");
                            self.reload(&mut view).await;
                            true
                        }
                        _ => false,
                    }
                }
            };

            if !changed {
                continue;
            }
            if !publish(&view, &state_tx, &message_tx).await {
                break;
            }

            // A new row or a new interval restarts the timer.
            let next_period = view.refresh_interval(self.default_refresh_minutes);
            let next_row = view.current().map(|r| r.id);
            if next_period != period {
                period = next_period;
                interval = new_interval(period);
            } else if next_row != tracked_row {
                interval.reset();
            }
            tracked_row = next_row;
        }

        debug!(%room_id, "RoomSession stopped");
    }

    /// Replace the view with the store's active row.
    async fn reload(&self, view: &mut LiveMatchView) -> bool {
        match self.store.active_for_room(self.room_id).await {
            Ok(row) => view.apply(ViewUpdate::Loaded(row)),
            Err(e) => {
                warn!(room_id = %self.room_id, error = %e, "Reload from store failed");
                false
            }
        }
    }
}

/// First tick one full period from now.
fn new_interval(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Push the current state out. Returns `false` when the owner is gone.
async fn publish(
    view: &LiveMatchView,
    state_tx: &watch::Sender<Option<RoomLiveMatch>>,
    message_tx: &mpsc::Sender<LiveMatchMessage>,
) -> bool {
    state_tx.send_replace(view.current().cloned());
    message_tx.send(view.message()).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::live_match_change_channel;
    use crate::processors::live_match_view::tests::{fixture, row};
    use crate::processors::match_poller::tests::ScriptedProvider;
    use crate::store::memory::MemoryStore;
    use matchday_sdk::objects::MatchStatus;

    const MINUTE: Duration = Duration::from_secs(60);

    struct Harness {
        room: Uuid,
        store: Arc<MemoryStore>,
        provider: Arc<ScriptedProvider>,
        changes: crate::events::LiveMatchChangeSender,
    }

    impl Harness {
        fn new(provider: ScriptedProvider) -> Self {
            let (changes, _) = live_match_change_channel();
            Self {
                room: Uuid::new_v4(),
                store: Arc::new(MemoryStore::new()),
                provider: Arc::new(provider),
                changes,
            }
        }

        fn spawn(&self) -> RoomSessionHandle {
            let poller = MatchPoller::new(self.provider.clone(), self.store.clone());
            RoomSession::new(
                self.room,
                poller,
                self.store.clone(),
                self.changes.subscribe(),
                2,
            )
            .spawn()
        }
    }

    fn snapshot(message: Option<LiveMatchMessage>) -> matchday_sdk::objects::LiveMatchResponse {
        match message {
            Some(LiveMatchMessage::Snapshot { live_match }) => live_match,
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn empty_room_never_polls() {
        let harness = Harness::new(ScriptedProvider::new(vec![]));
        let mut session = harness.spawn();
        assert_eq!(session.recv().await, Some(LiveMatchMessage::Cleared));

        tokio::time::sleep(30 * MINUTE).await;
        assert_eq!(harness.provider.calls(), 0);
        assert!(session.state().borrow().is_none());
        session.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn polls_on_interval_and_publishes() {
        let mut scored = fixture(100, MatchStatus::Live);
        scored.home_score = Some(1);
        let harness = Harness::new(ScriptedProvider::new(vec![Some(vec![scored.clone()])]));
        harness
            .store
            .activate(harness.room, fixture(100, MatchStatus::Live), None)
            .await;
        let mut session = harness.spawn();

        assert_eq!(snapshot(session.recv().await).match_data.home_score, Some(0));
        assert_eq!(harness.provider.calls(), 0);

        let polled = snapshot(session.recv().await);
        assert_eq!(polled.match_data, scored);
        assert_eq!(harness.provider.calls(), 1);
        session.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failing_provider_leaves_snapshot_unchanged() {
        let harness = Harness::new(ScriptedProvider::new(vec![None]));
        let row = harness
            .store
            .activate(harness.room, fixture(100, MatchStatus::Live), Some(1))
            .await;
        let mut session = harness.spawn();
        snapshot(session.recv().await);

        tokio::time::sleep(10 * MINUTE + Duration::from_secs(1)).await;
        assert_eq!(harness.provider.calls(), 10);
        assert_eq!(session.state().borrow().as_ref(), Some(&row));
        session.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn change_events_switch_and_clear() {
        let harness = Harness::new(ScriptedProvider::new(vec![]));
        let mut session = harness.spawn();
        assert_eq!(session.recv().await, Some(LiveMatchMessage::Cleared));

        let mut activated = row(5, harness.room, 300, 10);
        activated.match_data.0.status = MatchStatus::Upcoming;
        let _ = harness.changes.send(LiveMatchChange::Active(activated));
        // another room's change is filtered out
        let _ = harness
            .changes
            .send(LiveMatchChange::Active(row(6, Uuid::new_v4(), 400, 10)));
        assert_eq!(snapshot(session.recv().await).match_id, 300);

        let _ = harness.changes.send(LiveMatchChange::Inactive {
            id: 5,
            room_id: harness.room,
        });
        assert_eq!(session.recv().await, Some(LiveMatchMessage::Cleared));
        session.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_session_ignores_later_events() {
        let harness = Harness::new(ScriptedProvider::new(vec![]));
        let row = harness
            .store
            .activate(harness.room, fixture(100, MatchStatus::Live), None)
            .await;
        let session = harness.spawn();
        let state = session.state();
        assert_eq!(harness.changes.receiver_count(), 1);

        tokio::task::yield_now().await;
        session.stop().await;
        assert_eq!(harness.changes.receiver_count(), 0);

        let _ = harness.changes.send(LiveMatchChange::Inactive {
            id: row.id,
            room_id: harness.room,
        });
        tokio::time::sleep(10 * MINUTE).await;

        assert_eq!(state.borrow().as_ref(), Some(&row));
        assert_eq!(harness.provider.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn resync_reloads_activation_missed_by_the_stream() {
        let harness = Harness::new(ScriptedProvider::new(vec![]));
        harness
            .store
            .activate(harness.room, fixture(100, MatchStatus::Upcoming), None)
            .await;
        let mut session = harness.spawn();
        assert_eq!(snapshot(session.recv().await).match_id, 100);

        // written while the listener was disconnected
        harness
            .store
            .activate(harness.room, fixture(200, MatchStatus::Upcoming), None)
            .await;
        let _ = harness.changes.send(LiveMatchChange::Resync);
        assert_eq!(snapshot(session.recv().await).match_id, 200);
        session.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn poll_without_active_row_reloads_from_store() {
        let harness = Harness::new(ScriptedProvider::new(vec![Some(vec![fixture(
            100,
            MatchStatus::Live,
        )])]));
        harness
            .store
            .activate(harness.room, fixture(100, MatchStatus::Live), Some(1))
            .await;
        let mut session = harness.spawn();
        assert_eq!(snapshot(session.recv().await).match_id, 100);

        // switched with no change event reaching the session
        let switched = harness
            .store
            .activate(harness.room, fixture(200, MatchStatus::Upcoming), None)
            .await;
        assert_eq!(snapshot(session.recv().await).match_id, 200);
        assert_eq!(harness.provider.calls(), 1);

        tokio::time::sleep(30 * MINUTE).await;
        assert_eq!(harness.provider.calls(), 1);
        assert_eq!(session.state().borrow().as_ref(), Some(&switched));
        session.stop().await;
    }
}

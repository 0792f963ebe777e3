//! MatchPoller processor.
//!
//! One poll tick for one room view:
//! - skip unless the shown match is live;
//! - fetch all live fixtures from the provider;
//! - find the tracked match and, if the provider still reports it live,
//!   apply the snapshot to the view and persist it to the room's active
//!   row for that match.
//!
//! The poller never moves a snapshot out of `live`: a provider entry with
//! any other status is ignored, and ending a match is left to manual
//! deactivation arriving through the change stream. Provider and persist
//! failures are logged and leave the view as it was before the failure.

use crate::processors::live_match_view::{LiveMatchView, ViewUpdate};
use crate::providers::MatchDataProvider;
use crate::store::LiveMatchStore;
use crate::utils::refresh_interval::next_write_timestamp;
use matchday_sdk::objects::{FixtureQuery, MatchStatus};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing to poll: empty view or the match is not live.
    Idle,
    /// The provider call failed.
    ProviderFailed,
    /// The tracked match is not in the provider's live list.
    NotListed,
    /// The provider reports the match with a non-live status.
    Ignored(MatchStatus),
    /// The view was updated. `persisted` is false when the write-back failed
    /// or found no active row.
    Updated { persisted: bool },
}

#[derive(Clone)]
pub struct MatchPoller {
    provider: Arc<dyn MatchDataProvider>,
    store: Arc<dyn LiveMatchStore>,
}

impl MatchPoller {
    pub fn new(provider: Arc<dyn MatchDataProvider>, store: Arc<dyn LiveMatchStore>) -> Self {
        Self { provider, store }
    }

    /// Run one tick against `view`.
    pub async fn poll(&self, room_id: Uuid, view: &mut LiveMatchView) -> PollOutcome {
        if !view.is_polling() {
            return PollOutcome::Idle;
        }
        let Some(match_id) = view.tracked_match() else {
            return PollOutcome::Idle;
        };

        let fixtures = match self.provider.fixtures(&FixtureQuery::live()).await {
            Ok(fixtures) => fixtures,
            Err(e) => {
                warn!(%room_id, match_id, error = %e, "Live fixture fetch failed, keeping snapshot");
                return PollOutcome::ProviderFailed;
            }
        };

        let Some(fixture) = fixtures.into_iter().find(|f| f.id == match_id) else {
            debug!(%room_id, match_id, "Tracked match not in live list");
            return PollOutcome::NotListed;
        };

        if fixture.status != MatchStatus::Live {
            debug!(%room_id, match_id, status = %fixture.status, "Ignoring non-live provider status");
            return PollOutcome::Ignored(fixture.status);
        }

        let at = next_write_timestamp(view.updated_at(), time::OffsetDateTime::now_utc());
        if !view.apply(ViewUpdate::Polled {
            match_id,
            fixture: fixture.clone(),
            at,
        }) {
            return PollOutcome::Idle;
        }

        let persisted = match self.store.save_snapshot(room_id, match_id, &fixture, at).await {
            Ok(found) => {
                if !found {
                    debug!(%room_id, match_id, "No active row left for polled match");
                }
                found
            }
            Err(e) => {
                warn!(%room_id, match_id, error = %e, "Failed to persist polled snapshot");
                false
            }
        };
        PollOutcome::Updated { persisted }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::processors::live_match_view::tests::fixture;
    use crate::providers::ProviderError;
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;
    use matchday_sdk::objects::Fixture;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider double returning scripted answers, then repeating the last.
    #[derive(Default)]
    pub(crate) struct ScriptedProvider {
        script: Mutex<VecDeque<Option<Vec<Fixture>>>>,
        last: Mutex<Option<Option<Vec<Fixture>>>>,
        pub(crate) calls: AtomicUsize,
    }

    impl ScriptedProvider {
        /// `None` entries answer with an error.
        pub(crate) fn new(script: Vec<Option<Vec<Fixture>>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                ..Default::default()
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MatchDataProvider for ScriptedProvider {
        async fn fixtures(&self, _query: &FixtureQuery) -> Result<Vec<Fixture>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            let answer = match next {
                Some(answer) => {
                    *self.last.lock().unwrap() = Some(answer.clone());
                    answer
                }
                None => self.last.lock().unwrap().clone().flatten(),
            };
            answer.ok_or(ProviderError::Status { status: 503 })
        }
    }

    async fn setup(
        provider: ScriptedProvider,
    ) -> (Uuid, Arc<MemoryStore>, Arc<ScriptedProvider>, LiveMatchView) {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(provider);
        let room = Uuid::new_v4();
        let row = store
            .activate(room, fixture(100, MatchStatus::Live), None)
            .await;
        let mut view = LiveMatchView::new();
        view.apply(ViewUpdate::Loaded(Some(row)));
        (room, store, provider, view)
    }

    #[tokio::test]
    async fn live_entry_updates_view_and_row() {
        let mut scored = fixture(100, MatchStatus::Live);
        scored.home_score = Some(1);
        scored.minute = Some(37);
        let (room, store, provider, mut view) =
            setup(ScriptedProvider::new(vec![Some(vec![scored.clone()])])).await;
        let poller = MatchPoller::new(provider, store.clone());

        let outcome = poller.poll(room, &mut view).await;
        assert_eq!(outcome, PollOutcome::Updated { persisted: true });
        assert_eq!(view.current().unwrap().fixture(), &scored);

        let stored = store.active_for_room(room).await.unwrap().unwrap();
        assert_eq!(stored.fixture(), &scored);
        assert_eq!(Some(stored.updated_at), view.updated_at());
    }

    #[tokio::test]
    async fn finished_entry_does_not_flip_status() {
        let (room, store, provider, mut view) = setup(ScriptedProvider::new(vec![Some(vec![
            fixture(100, MatchStatus::Finished),
        ])]))
        .await;
        let before = view.clone();
        let poller = MatchPoller::new(provider, store.clone());

        let outcome = poller.poll(room, &mut view).await;
        assert_eq!(outcome, PollOutcome::Ignored(MatchStatus::Finished));
        assert_eq!(view, before);
        assert_eq!(view.current().unwrap().status(), MatchStatus::Live);
        let stored = store.active_for_room(room).await.unwrap().unwrap();
        assert_eq!(stored.status(), MatchStatus::Live);
    }

    #[tokio::test]
    async fn provider_failure_keeps_snapshot() {
        let (room, store, provider, mut view) = setup(ScriptedProvider::new(vec![None])).await;
        let before = view.clone();
        let poller = MatchPoller::new(provider.clone(), store);

        for _ in 0..3 {
            assert_eq!(poller.poll(room, &mut view).await, PollOutcome::ProviderFailed);
        }
        assert_eq!(view, before);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn absent_match_is_not_updated() {
        let (room, store, provider, mut view) = setup(ScriptedProvider::new(vec![Some(vec![
            fixture(555, MatchStatus::Live),
        ])]))
        .await;
        let before = view.clone();
        let poller = MatchPoller::new(provider, store);
        assert_eq!(poller.poll(room, &mut view).await, PollOutcome::NotListed);
        assert_eq!(view, before);
    }

    #[tokio::test]
    async fn empty_view_never_calls_provider() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let poller = MatchPoller::new(provider.clone(), Arc::new(MemoryStore::new()));
        let mut view = LiveMatchView::new();
        assert_eq!(
            poller.poll(Uuid::new_v4(), &mut view).await,
            PollOutcome::Idle
        );
        assert_eq!(provider.calls(), 0);
    }
}

//! In-memory store used by tests and local runs without Postgres.

use super::{LiveMatchStore, NotificationStore, SubscriptionStore};
use crate::entities::{Notification, PushSubscription, RoomLiveMatch, db_timestamp};
use async_trait::async_trait;
use matchday_sdk::objects::{Fixture, PushSubscriptionDescriptor};
use sqlx::types::Json;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    next_id: i64,
    live_matches: Vec<RoomLiveMatch>,
    subscriptions: Vec<PushSubscription>,
    notifications: Vec<Notification>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Every store seam over plain vectors behind one async mutex.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same contract as the `ActivateLiveMatch` processor: deactivate the
    /// room's active rows, then insert the new one, under one lock.
    pub async fn activate(
        &self,
        room_id: Uuid,
        fixture: Fixture,
        update_interval_minutes: Option<i32>,
    ) -> RoomLiveMatch {
        let now = db_timestamp(time::OffsetDateTime::now_utc());
        let mut tables = self.tables.lock().await;
        for row in tables
            .live_matches
            .iter_mut()
            .filter(|r| r.room_id == room_id && r.is_active)
        {
            row.is_active = false;
            row.updated_at = now;
        }
        let row = RoomLiveMatch {
            id: tables.next_id(),
            room_id,
            match_id: fixture.id,
            match_data: Json(fixture),
            is_active: true,
            activated_by: None,
            update_interval_minutes,
            updated_at: now,
        };
        tables.live_matches.push(row.clone());
        row
    }

    /// Same contract as the `DeactivateLiveMatch` processor.
    pub async fn deactivate(&self, room_id: Uuid) -> u64 {
        let now = db_timestamp(time::OffsetDateTime::now_utc());
        let mut tables = self.tables.lock().await;
        let mut count = 0;
        for row in tables
            .live_matches
            .iter_mut()
            .filter(|r| r.room_id == room_id && r.is_active)
        {
            row.is_active = false;
            row.updated_at = now;
            count += 1;
        }
        count
    }

    pub async fn live_matches(&self, room_id: Uuid) -> Vec<RoomLiveMatch> {
        let tables = self.tables.lock().await;
        tables
            .live_matches
            .iter()
            .filter(|r| r.room_id == room_id)
            .cloned()
            .collect()
    }

    pub async fn add_subscription(
        &self,
        user_id: Uuid,
        descriptor: &PushSubscriptionDescriptor,
    ) -> i64 {
        let subscription = serde_json::to_value(descriptor).unwrap_or_default();
        self.add_raw_subscription(user_id, subscription).await
    }

    /// Store an arbitrary JSON value as a subscription descriptor.
    pub async fn add_raw_subscription(&self, user_id: Uuid, subscription: serde_json::Value) -> i64 {
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        tables.subscriptions.push(PushSubscription {
            id,
            user_id,
            subscription,
            created_at: time::OffsetDateTime::now_utc(),
        });
        id
    }

    /// Insert or replace a notification row.
    pub async fn put_notification(&self, notification: Notification) {
        let mut tables = self.tables.lock().await;
        tables.notifications.retain(|n| n.id != notification.id);
        tables.notifications.push(notification);
    }
}

#[async_trait]
impl LiveMatchStore for MemoryStore {
    async fn active_for_room(&self, room_id: Uuid) -> Result<Option<RoomLiveMatch>, sqlx::Error> {
        let tables = self.tables.lock().await;
        Ok(tables
            .live_matches
            .iter()
            .find(|r| r.room_id == room_id && r.is_active)
            .cloned())
    }

    async fn live_match_by_id(&self, id: i64) -> Result<Option<RoomLiveMatch>, sqlx::Error> {
        let tables = self.tables.lock().await;
        Ok(tables.live_matches.iter().find(|r| r.id == id).cloned())
    }

    async fn save_snapshot(
        &self,
        room_id: Uuid,
        match_id: i64,
        fixture: &Fixture,
        updated_at: time::OffsetDateTime,
    ) -> Result<bool, sqlx::Error> {
        let mut tables = self.tables.lock().await;
        let Some(row) = tables
            .live_matches
            .iter_mut()
            .find(|r| r.room_id == room_id && r.match_id == match_id && r.is_active)
        else {
            return Ok(false);
        };
        row.match_data = Json(fixture.clone());
        row.updated_at = updated_at;
        Ok(true)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn notification_by_id(&self, id: Uuid) -> Result<Option<Notification>, sqlx::Error> {
        let tables = self.tables.lock().await;
        Ok(tables.notifications.iter().find(|n| n.id == id).cloned())
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn subscriptions_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PushSubscription>, sqlx::Error> {
        let tables = self.tables.lock().await;
        Ok(tables
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_subscription(&self, id: i64) -> Result<(), sqlx::Error> {
        let mut tables = self.tables.lock().await;
        tables.subscriptions.retain(|s| s.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchday_sdk::objects::MatchStatus;
    use std::sync::Arc;

    fn fixture(id: i64) -> Fixture {
        Fixture {
            id,
            home_team: "Home".into(),
            away_team: "Away".into(),
            home_logo: None,
            away_logo: None,
            home_score: Some(0),
            away_score: Some(0),
            status: MatchStatus::Live,
            minute: Some(1),
            league: "League".into(),
            league_logo: None,
            kickoff: None,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_activations_leave_one_active_row() {
        let store = Arc::new(MemoryStore::new());
        let room = Uuid::new_v4();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.activate(room, fixture(100 + i), None).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let rows = store.live_matches(room).await;
        assert_eq!(rows.len(), 8);
        assert_eq!(rows.iter().filter(|r| r.is_active).count(), 1);
        let active = store.active_for_room(room).await.unwrap().unwrap();
        assert_eq!(active.id, rows.iter().map(|r| r.id).max().unwrap());
    }

    #[tokio::test]
    async fn snapshot_only_touches_active_row_of_same_match() {
        let store = MemoryStore::new();
        let room = Uuid::new_v4();
        store.activate(room, fixture(100), None).await;

        let mut polled = fixture(100);
        polled.home_score = Some(1);
        let at = time::OffsetDateTime::now_utc();
        assert!(!store.save_snapshot(room, 999, &polled, at).await.unwrap());
        assert!(store.save_snapshot(room, 100, &polled, at).await.unwrap());

        store.activate(room, fixture(200), None).await;
        assert!(!store.save_snapshot(room, 100, &polled, at).await.unwrap());
    }
}

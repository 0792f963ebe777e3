//! Store seams used by the long-running processors.
//!
//! The processors only need a handful of reads and writes; taking them as
//! trait objects keeps the poller, room sessions, change listener and push
//! dispatcher independent of Postgres. [`DatabaseProcessor`] implements
//! every trait by delegating to the entity processors;
//! [`memory::MemoryStore`] backs tests.

pub mod memory;

use crate::entities::notification::GetNotificationById;
use crate::entities::push_subscription::{DeleteSubscriptionById, GetSubscriptionsForUser};
use crate::entities::room_live_match::{GetActiveLiveMatch, GetLiveMatchById, SaveLiveMatchSnapshot};
use crate::entities::{Notification, PushSubscription, RoomLiveMatch};
use crate::framework::DatabaseProcessor;
use async_trait::async_trait;
use kanau::processor::Processor;
use matchday_sdk::objects::Fixture;
use uuid::Uuid;

#[async_trait]
pub trait LiveMatchStore: Send + Sync {
    async fn active_for_room(&self, room_id: Uuid) -> Result<Option<RoomLiveMatch>, sqlx::Error>;

    async fn live_match_by_id(&self, id: i64) -> Result<Option<RoomLiveMatch>, sqlx::Error>;

    /// Persist a polled snapshot to the room's active row for `match_id`.
    /// Returns `false` when no such row exists anymore.
    async fn save_snapshot(
        &self,
        room_id: Uuid,
        match_id: i64,
        fixture: &Fixture,
        updated_at: time::OffsetDateTime,
    ) -> Result<bool, sqlx::Error>;
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn subscriptions_for_user(&self, user_id: Uuid)
    -> Result<Vec<PushSubscription>, sqlx::Error>;

    async fn delete_subscription(&self, id: i64) -> Result<(), sqlx::Error>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn notification_by_id(&self, id: Uuid) -> Result<Option<Notification>, sqlx::Error>;
}

#[async_trait]
impl LiveMatchStore for DatabaseProcessor {
    async fn active_for_room(&self, room_id: Uuid) -> Result<Option<RoomLiveMatch>, sqlx::Error> {
        self.process(GetActiveLiveMatch { room_id }).await
    }

    async fn live_match_by_id(&self, id: i64) -> Result<Option<RoomLiveMatch>, sqlx::Error> {
        self.process(GetLiveMatchById { id }).await
    }

    async fn save_snapshot(
        &self,
        room_id: Uuid,
        match_id: i64,
        fixture: &Fixture,
        updated_at: time::OffsetDateTime,
    ) -> Result<bool, sqlx::Error> {
        self.process(SaveLiveMatchSnapshot {
            room_id,
            match_id,
            fixture: fixture.clone(),
            updated_at,
        })
        .await
    }
}

#[async_trait]
impl SubscriptionStore for DatabaseProcessor {
    async fn subscriptions_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PushSubscription>, sqlx::Error> {
        self.process(GetSubscriptionsForUser { user_id }).await
    }

    async fn delete_subscription(&self, id: i64) -> Result<(), sqlx::Error> {
        self.process(DeleteSubscriptionById { id }).await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for DatabaseProcessor {
    async fn notification_by_id(&self, id: Uuid) -> Result<Option<Notification>, sqlx::Error> {
        self.process(GetNotificationById { id }).await
    }
}

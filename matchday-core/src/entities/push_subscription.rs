use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use matchday_sdk::objects::PushSubscriptionDescriptor;
use matchday_sdk::webpush::{PushTarget, WebPushError};
use sqlx::types::Json;
use uuid::Uuid;

/// A registered browser push endpoint.
///
/// `subscription` is kept as raw JSON: a malformed stored descriptor must
/// not fail the whole listing, only its own delivery.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PushSubscription {
    pub id: i64,
    pub user_id: Uuid,
    pub subscription: serde_json::Value,
    pub created_at: time::OffsetDateTime,
}

impl PushSubscription {
    pub fn descriptor(&self) -> Result<PushSubscriptionDescriptor, serde_json::Error> {
        serde_json::from_value(self.subscription.clone())
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.subscription.get("endpoint").and_then(|e| e.as_str())
    }

    /// Decode the delivery target, validating the keys.
    pub fn target(&self) -> Result<PushTarget, WebPushError> {
        PushTarget::from_descriptor(&self.descriptor()?)
    }
}

#[derive(Debug, Clone)]
/// All subscriptions of one user.
pub struct GetSubscriptionsForUser {
    pub user_id: Uuid,
}

impl Processor<GetSubscriptionsForUser> for DatabaseProcessor {
    type Output = Vec<PushSubscription>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetSubscriptionsForUser")]
    async fn process(
        &self,
        query: GetSubscriptionsForUser,
    ) -> Result<Vec<PushSubscription>, sqlx::Error> {
        sqlx::query_as::<_, PushSubscription>(
            r#"
            SELECT id, user_id, subscription, created_at
            FROM push_subscriptions
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(query.user_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Store a subscription unless the user already has one for the same
/// endpoint. Returns `true` when a row was inserted.
pub struct InsertSubscriptionIfAbsent {
    pub user_id: Uuid,
    pub descriptor: PushSubscriptionDescriptor,
}

impl Processor<InsertSubscriptionIfAbsent> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertSubscriptionIfAbsent")]
    async fn process(&self, cmd: InsertSubscriptionIfAbsent) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO push_subscriptions (user_id, subscription)
            VALUES ($1, $2)
            ON CONFLICT (user_id, (subscription->>'endpoint')) DO NOTHING
            "#,
        )
        .bind(cmd.user_id)
        .bind(Json(&cmd.descriptor))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[derive(Debug, Clone)]
pub struct DeleteSubscriptionById {
    pub id: i64,
}

impl Processor<DeleteSubscriptionById> for DatabaseProcessor {
    type Output = u64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:DeleteSubscriptionById")]
    async fn process(&self, cmd: DeleteSubscriptionById) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM push_subscriptions WHERE id = $1")
            .bind(cmd.id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone)]
/// Unsubscribe one device of a user.
pub struct DeleteSubscriptionByEndpoint {
    pub user_id: Uuid,
    pub endpoint: String,
}

impl Processor<DeleteSubscriptionByEndpoint> for DatabaseProcessor {
    type Output = u64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:DeleteSubscriptionByEndpoint")]
    async fn process(&self, cmd: DeleteSubscriptionByEndpoint) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM push_subscriptions WHERE user_id = $1 AND subscription->>'endpoint' = $2",
        )
        .bind(cmd.user_id)
        .bind(&cmd.endpoint)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_descriptor_is_reported_per_row() {
        let row = PushSubscription {
            id: 1,
            user_id: Uuid::nil(),
            subscription: serde_json::json!({ "endpoint": "https://push.example.net/1" }),
            created_at: time::OffsetDateTime::UNIX_EPOCH,
        };
        assert_eq!(row.endpoint(), Some("https://push.example.net/1"));
        assert!(matches!(row.target(), Err(WebPushError::Json(_))));
    }
}

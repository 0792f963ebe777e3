//! PushDispatcher processor.
//!
//! Fans one inserted notification out to every registered device of its
//! user:
//! - loads the user's subscriptions (none means done);
//! - serializes the `{title, message, data}` payload once;
//! - delivers to all endpoints concurrently, each independently;
//! - deletes subscriptions the push service reports as gone (404/410);
//! - reports how many endpoints ended delivered, pruned or failed.
//!
//! Each endpoint goes `pending -> delivered | pruned | failed`. By default
//! a failed endpoint is not retried; with `max_attempts > 1` transient
//! failures are retried inside the same invocation with exponential
//! backoff.

use crate::entities::PushSubscription;
use crate::providers::PushDelivery;
use crate::store::SubscriptionStore;
use futures_util::future::join_all;
use matchday_sdk::objects::{DispatchAck, NotificationRecord, PushMessage};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Largest backoff exponent (2^6 = 64 seconds).
const MAX_RETRY_EXPONENT: u32 = 6;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("record has no user_id")]
    MissingUserId,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Final state of one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Pruned,
    Failed,
}

/// Outcome counts of one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: u32,
    pub pruned: u32,
    pub failed: u32,
}

impl DispatchReport {
    fn record(&mut self, outcome: DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Delivered => self.delivered += 1,
            DeliveryOutcome::Pruned => self.pruned += 1,
            DeliveryOutcome::Failed => self.failed += 1,
        }
    }

    pub fn attempted(&self) -> u32 {
        self.delivered + self.pruned + self.failed
    }
}

impl From<DispatchReport> for DispatchAck {
    fn from(report: DispatchReport) -> Self {
        DispatchAck {
            success: true,
            delivered: report.delivered,
            pruned: report.pruned,
            failed: report.failed,
            message: (report.attempted() == 0).then(|| "no subscriptions".to_string()),
        }
    }
}

pub struct PushDispatcher {
    store: Arc<dyn SubscriptionStore>,
    delivery: Arc<dyn PushDelivery>,
    max_attempts: u32,
}

impl PushDispatcher {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        delivery: Arc<dyn PushDelivery>,
        max_attempts: u32,
    ) -> Self {
        Self {
            store,
            delivery,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Deliver `record` to every subscription of its user.
    #[tracing::instrument(skip_all, fields(user_id = tracing::field::Empty))]
    pub async fn dispatch(&self, record: &NotificationRecord) -> Result<DispatchReport, DispatchError> {
        let user_id = record.user_id.ok_or(DispatchError::MissingUserId)?;
        tracing::Span::current().record("user_id", tracing::field::display(user_id));

        let subscriptions = self.store.subscriptions_for_user(user_id).await?;
        if subscriptions.is_empty() {
            debug!("No push subscriptions");
            return Ok(DispatchReport::default());
        }

        let payload = serde_json::to_vec(&PushMessage {
            title: record.title.clone(),
            message: record.message.clone(),
            data: record.data.clone(),
        })?;

        let outcomes = join_all(
            subscriptions
                .iter()
                .map(|subscription| self.deliver_one(user_id, subscription, &payload)),
        )
        .await;

        let mut report = DispatchReport::default();
        for outcome in outcomes {
            report.record(outcome);
        }
        info!(
            delivered = report.delivered,
            pruned = report.pruned,
            failed = report.failed,
            "Push fan-out complete"
        );
        Ok(report)
    }

    async fn deliver_one(
        &self,
        user_id: Uuid,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> DeliveryOutcome {
        let target = match subscription.target() {
            Ok(target) => target,
            Err(e) => {
                warn!(%user_id, subscription_id = subscription.id, error = %e, "Malformed push subscription");
                return DeliveryOutcome::Failed;
            }
        };

        let mut attempt = 0;
        let error = loop {
            attempt += 1;
            match self.delivery.deliver(&target, payload).await {
                Ok(()) => return DeliveryOutcome::Delivered,
                Err(e) if attempt < self.max_attempts && e.is_transient() => {
                    let delay = calculate_retry_delay(attempt - 1);
                    debug!(
                        %user_id,
                        subscription_id = subscription.id,
                        attempt,
                        error = %e,
                        "Push delivery failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => break e,
            }
        };

        if error.is_gone() {
            return match self.store.delete_subscription(subscription.id).await {
                Ok(()) => {
                    info!(%user_id, subscription_id = subscription.id, "Pruned expired push subscription");
                    DeliveryOutcome::Pruned
                }
                Err(e) => {
                    warn!(%user_id, subscription_id = subscription.id, error = %e, "Failed to prune push subscription");
                    DeliveryOutcome::Failed
                }
            };
        }

        warn!(%user_id, subscription_id = subscription.id, attempts = attempt, error = %error, "Push delivery failed");
        DeliveryOutcome::Failed
    }
}

/// Backoff before retry number `retry_count + 1`: 2^retry_count seconds,
/// capped.
pub fn calculate_retry_delay(retry_count: u32) -> std::time::Duration {
    let seconds = 2u64.pow(retry_count.min(MAX_RETRY_EXPONENT));
    std::time::Duration::from_secs(seconds)
}

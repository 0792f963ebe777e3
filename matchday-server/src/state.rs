//! Application state shared across all request handlers.

use matchday_core::config::{FootballConfig, PushConfig, SharedConfig};
use matchday_core::events::ChangeSenders;
use matchday_core::framework::DatabaseProcessor;
use matchday_core::processors::PushDispatcher;
use matchday_core::providers::{ApiFootballProvider, MatchDataProvider, WebPushClient};
use matchday_core::store::{LiveMatchStore, SubscriptionStore};
use matchday_sdk::webpush::WebPushError;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The push side of the service, present only when `[push]` is configured.
#[derive(Clone)]
pub struct PushService {
    pub dispatcher: Arc<PushDispatcher>,
    /// VAPID application server key handed to browsers.
    pub public_key: String,
}

impl PushService {
    /// Build the Web Push client and the dispatcher on top of `store`.
    pub fn from_config(
        config: &PushConfig,
        store: Arc<dyn SubscriptionStore>,
    ) -> Result<Self, WebPushError> {
        let client = WebPushClient::new(config)?;
        let public_key = client.public_key().to_string();
        Ok(Self {
            dispatcher: Arc::new(PushDispatcher::new(
                store,
                Arc::new(client),
                config.max_attempts,
            )),
            public_key,
        })
    }
}

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Runtime configuration (sections reloaded via SIGHUP).
    pub config: SharedConfig,
    /// Row change streams fed by the change listener.
    pub changes: ChangeSenders,
    pub provider: Arc<RwLock<Arc<dyn MatchDataProvider>>>,
    pub push: Arc<RwLock<Option<PushService>>>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        config: SharedConfig,
        changes: ChangeSenders,
        provider: Arc<dyn MatchDataProvider>,
        push: Option<PushService>,
    ) -> Self {
        Self {
            db,
            config,
            changes,
            provider: Arc::new(RwLock::new(provider)),
            push: Arc::new(RwLock::new(push)),
        }
    }

    /// Database processor over the shared pool.
    pub fn processor(&self) -> DatabaseProcessor {
        DatabaseProcessor::new(self.db.clone())
    }

    pub fn live_match_store(&self) -> Arc<dyn LiveMatchStore> {
        Arc::new(self.processor())
    }

    pub fn subscription_store(&self) -> Arc<dyn SubscriptionStore> {
        Arc::new(self.processor())
    }

    /// The current match data provider.
    pub async fn provider(&self) -> Arc<dyn MatchDataProvider> {
        self.provider.read().await.clone()
    }

    /// The current push service, if configured.
    pub async fn push(&self) -> Option<PushService> {
        self.push.read().await.clone()
    }

    /// Swap the provider after the `[football]` section changed.
    pub async fn rebuild_provider(&self, football: &FootballConfig) {
        *self.provider.write().await = Arc::new(ApiFootballProvider::new(football));
    }

    /// Swap the push service after the `[push]` section changed.
    ///
    /// A section that fails to build leaves push unconfigured.
    pub async fn rebuild_push(&self, push: Option<&PushConfig>) {
        let service = push.and_then(|config| {
            PushService::from_config(config, self.subscription_store())
                .inspect_err(|e| tracing::error!(error = %e, "Failed to build push service"))
                .ok()
        });
        *self.push.write().await = service;
    }
}

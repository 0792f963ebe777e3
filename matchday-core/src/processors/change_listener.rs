//! ChangeListener processor.
//!
//! Holds one Postgres `LISTEN` connection for the row change channels the
//! database triggers publish on. Every notice names a row by key; the
//! listener reads that row back through the store seams and fans the
//! result out on the broadcast channels in [`ChangeSenders`]. Arrival
//! order is kept.
//!
//! Notices sent while the connection is down are lost, so after every
//! reconnect a `Resync` marker goes out on each channel and subscribers
//! reload from the store.

use crate::events::{
    ChangeOp, ChangeSenders, LiveMatchChange, LiveMatchNotice, NotificationChange,
    NotificationNotice,
};
use crate::framework::DatabaseProcessor;
use crate::store::{LiveMatchStore, NotificationStore};
use sqlx::PgPool;
use sqlx::postgres::PgListener;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

pub const LIVE_MATCH_CHANNEL: &str = "room_live_match_changes";
pub const NOTIFICATION_CHANNEL: &str = "notification_changes";

const RECONNECT_DELAY: std::time::Duration = std::time::Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid payload on {channel}: {source}")]
    Payload {
        channel: String,
        source: serde_json::Error,
    },

    #[error("unknown channel {0}")]
    UnknownChannel(String),
}

pub struct ChangeListener {
    pool: PgPool,
    senders: ChangeSenders,
    live_matches: Arc<dyn LiveMatchStore>,
    notifications: Arc<dyn NotificationStore>,
}

impl ChangeListener {
    /// Listen on `pool` and read changed rows back from the same pool.
    pub fn new(pool: PgPool, senders: ChangeSenders) -> Self {
        let processor = Arc::new(DatabaseProcessor::new(pool.clone()));
        Self::with_stores(pool, senders, processor.clone(), processor)
    }

    pub fn with_stores(
        pool: PgPool,
        senders: ChangeSenders,
        live_matches: Arc<dyn LiveMatchStore>,
        notifications: Arc<dyn NotificationStore>,
    ) -> Self {
        Self {
            pool,
            senders,
            live_matches,
            notifications,
        }
    }

    /// Run until shutdown is signaled.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("ChangeListener started");
        let mut missed = false;

        loop {
            let mut listener = match self.connect().await {
                Ok(listener) => listener,
                Err(e) => {
                    error!(error = %e, "Failed to LISTEN for row changes");
                    missed = true;
                    tokio::select! {
                        _ = shutdown_rx.changed() => break,
                        _ = tokio::time::sleep(RECONNECT_DELAY) => continue,
                    }
                }
            };
            if missed {
                info!("Row change connection re-established");
                self.broadcast_resync();
                missed = false;
            }

            let lost = loop {
                tokio::select! {
                    biased;

                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            info!("ChangeListener received shutdown signal");
                            return;
                        }
                    }

                    notification = listener.try_recv() => match notification {
                        Ok(Some(notification)) => {
                            if let Err(e) = self.dispatch(notification.channel(), notification.payload()).await {
                                warn!(error = %e, "Dropping row change");
                            }
                        }
                        Ok(None) => {
                            warn!("Row change connection lost");
                            break false;
                        }
                        Err(e) => {
                            warn!(error = %e, "Row change connection failed");
                            break true;
                        }
                    }
                }
            };
            missed = true;

            if lost {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                }
            }
        }

        info!("ChangeListener shutdown complete");
    }

    async fn connect(&self) -> Result<PgListener, sqlx::Error> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener
            .listen_all([LIVE_MATCH_CHANNEL, NOTIFICATION_CHANNEL])
            .await?;
        Ok(listener)
    }

    /// Tell every subscriber that changes may have been missed.
    pub fn broadcast_resync(&self) {
        let _ = self.senders.live_match.send(LiveMatchChange::Resync);
        let _ = self.senders.notification.send(NotificationChange::Resync);
    }

    /// Decode one notice, read its row and broadcast the change. Having no
    /// subscribers is fine.
    pub async fn dispatch(&self, channel: &str, payload: &str) -> Result<(), ListenerError> {
        let payload_error = |source| ListenerError::Payload {
            channel: channel.to_string(),
            source,
        };
        match channel {
            LIVE_MATCH_CHANNEL => {
                let notice: LiveMatchNotice =
                    serde_json::from_str(payload).map_err(payload_error)?;
                let change = self.live_match_change(notice).await?;
                debug!(op = ?notice.op, room_id = %notice.room_id, "Live match row changed");
                let _ = self.senders.live_match.send(change);
            }
            NOTIFICATION_CHANNEL => {
                let notice: NotificationNotice =
                    serde_json::from_str(payload).map_err(payload_error)?;
                debug!(op = ?notice.op, user_id = %notice.user_id, "Notification row changed");
                if let Some(change) = self.notification_change(notice).await? {
                    let _ = self.senders.notification.send(change);
                }
            }
            other => return Err(ListenerError::UnknownChannel(other.to_string())),
        }
        Ok(())
    }

    async fn live_match_change(
        &self,
        notice: LiveMatchNotice,
    ) -> Result<LiveMatchChange, sqlx::Error> {
        let inactive = LiveMatchChange::Inactive {
            id: notice.id,
            room_id: notice.room_id,
        };
        if notice.op == ChangeOp::Delete || !notice.is_active {
            return Ok(inactive);
        }
        // the row may have been deactivated or deleted since the notice
        Ok(match self.live_matches.live_match_by_id(notice.id).await? {
            Some(row) if row.is_active => LiveMatchChange::Active(row),
            _ => inactive,
        })
    }

    async fn notification_change(
        &self,
        notice: NotificationNotice,
    ) -> Result<Option<NotificationChange>, sqlx::Error> {
        if notice.op == ChangeOp::Delete {
            return Ok(Some(NotificationChange::Deleted {
                id: notice.id,
                user_id: notice.user_id,
            }));
        }
        let Some(row) = self.notifications.notification_by_id(notice.id).await? else {
            debug!(id = %notice.id, "Notification gone before it was read back");
            return Ok(None);
        };
        Ok(Some(match notice.op {
            ChangeOp::Insert => NotificationChange::Created(row),
            _ => NotificationChange::Updated(row),
        }))
    }
}

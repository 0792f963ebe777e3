//! Web Push delivery.
//!
//! [`WebPushClient`] encrypts one payload for one browser endpoint and
//! POSTs it to the push service with VAPID authorization.

use crate::config::PushConfig;
use async_trait::async_trait;
use matchday_sdk::webpush::{self, PushTarget, VapidSigner, WebPushError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The push service answered with a non-2xx status.
    #[error("push service rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("push request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("could not prepare push message: {0}")]
    Prepare(#[from] WebPushError),
}

impl DeliveryError {
    /// 404 and 410 mean the subscription is expired or was revoked.
    pub fn is_gone(&self) -> bool {
        matches!(self, DeliveryError::Rejected { status: 404 | 410, .. })
    }

    /// Whether a later attempt could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            DeliveryError::Rejected { status, .. } => *status == 429 || *status >= 500,
            DeliveryError::Request(_) => true,
            DeliveryError::Prepare(_) => false,
        }
    }
}

/// Something that can deliver one payload to one endpoint.
#[async_trait]
pub trait PushDelivery: Send + Sync {
    async fn deliver(&self, target: &PushTarget, payload: &[u8]) -> Result<(), DeliveryError>;
}

pub struct WebPushClient {
    signer: VapidSigner,
    ttl_seconds: u32,
    http_client: reqwest::Client,
}

impl WebPushClient {
    pub fn new(config: &PushConfig) -> Result<Self, WebPushError> {
        let signer = VapidSigner::from_base64_keys(
            &config.vapid_public_key,
            &config.vapid_private_key,
            config.subject.clone(),
        )?;
        Ok(Self {
            signer,
            ttl_seconds: config.ttl_seconds,
            http_client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        })
    }

    /// The application server key clients subscribe with.
    pub fn public_key(&self) -> &str {
        self.signer.public_key()
    }
}

#[async_trait]
impl PushDelivery for WebPushClient {
    async fn deliver(&self, target: &PushTarget, payload: &[u8]) -> Result<(), DeliveryError> {
        let body = webpush::encrypt(payload, target)?;
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        let authorization = self.signer.authorization(&target.endpoint, now)?;

        let response = self
            .http_client
            .post(&target.endpoint)
            .header("Authorization", authorization)
            .header("TTL", self.ttl_seconds.to_string())
            .header("Urgency", "normal")
            .header("Content-Encoding", "aes128gcm")
            .header("Content-Type", "application/octet-stream")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(status: u16) -> DeliveryError {
        DeliveryError::Rejected {
            status,
            body: String::new(),
        }
    }

    #[test]
    fn gone_statuses() {
        assert!(rejected(404).is_gone());
        assert!(rejected(410).is_gone());
        assert!(!rejected(400).is_gone());
        assert!(!rejected(500).is_gone());
    }

    #[test]
    fn transient_statuses() {
        assert!(rejected(503).is_transient());
        assert!(rejected(429).is_transient());
        assert!(!rejected(410).is_transient());
        assert!(!rejected(413).is_transient());
        assert!(!DeliveryError::Prepare(WebPushError::Crypto).is_transient());
    }
}

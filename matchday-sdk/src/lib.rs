//! Shared types for the Matchday live-match and notification service.
//!
//! - [`objects`]: JSON wire objects used by the HTTP/WebSocket API and the
//!   store webhooks.
//! - [`signature`]: HMAC-SHA256 body signing for webhook calls.
//! - [`webpush`]: Web Push payload encryption (RFC 8291) and VAPID
//!   authentication (RFC 8292).

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(unsafe_code)]

pub mod objects;
pub mod signature;
pub mod webpush;

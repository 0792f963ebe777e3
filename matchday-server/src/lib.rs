//! Matchday server
//!
//! HTTP/WebSocket front of the live-match and notification service.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod server;
pub mod shutdown;
pub mod state;

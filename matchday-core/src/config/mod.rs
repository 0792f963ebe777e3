//! Runtime configuration types.
//!
//! These are the validated sections the processors and the server read at
//! runtime. Loading and parsing the TOML file happens in the server crate;
//! a reload swaps each section behind its own lock.

mod football;
mod hooks;
mod push;
mod server;
mod service;

pub use football::{DEFAULT_FOOTBALL_BASE_URL, DEFAULT_REFRESH_MINUTES, FootballConfig};
pub use hooks::HooksConfig;
pub use push::PushConfig;
pub use server::ServerConfig;
pub use service::ServiceConfig;

use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared configuration state with separate locks for each section.
#[derive(Clone)]
pub struct SharedConfig {
    pub server: Arc<RwLock<ServerConfig>>,
    /// Moderator/admin authentication.
    pub service: Arc<RwLock<ServiceConfig>>,
    pub football: Arc<RwLock<FootballConfig>>,
    /// `None` when the `[push]` section is absent.
    pub push: Arc<RwLock<Option<PushConfig>>>,
    pub hooks: Arc<RwLock<HooksConfig>>,
}

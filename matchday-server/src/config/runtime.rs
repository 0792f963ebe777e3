//! Runtime configuration re-exports.
//!
//! The validated config types live in `matchday_core::config`.

pub use matchday_core::config::{
    FootballConfig, HooksConfig, PushConfig, ServerConfig, ServiceConfig, SharedConfig,
};

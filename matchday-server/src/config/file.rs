//! TOML file configuration structures.
//!
//! These structs directly map to the `matchday-config.toml` file format.

use matchday_core::config::{DEFAULT_FOOTBALL_BASE_URL, DEFAULT_REFRESH_MINUTES};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub server: ServerConfig,
    pub service: ServiceConfig,
    pub football: FootballConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push: Option<PushConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<HooksConfig>,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

/// Moderator/admin authentication section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// The service secret. If this is plaintext (doesn't start with
    /// `$argon2`), it will be hashed and the config file will be rewritten.
    pub secret: String,
}

/// Match data provider section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FootballConfig {
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_refresh_minutes")]
    pub default_refresh_minutes: u32,
}

fn default_base_url() -> String {
    DEFAULT_FOOTBALL_BASE_URL.to_string()
}

fn default_refresh_minutes() -> u32 {
    DEFAULT_REFRESH_MINUTES
}

/// Web Push section. Without it the notification webhook answers 500.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    pub vapid_public_key: String,
    pub vapid_private_key: String,
    pub subject: String,
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u32,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_ttl_seconds() -> u32 {
    86_400
}

fn default_max_attempts() -> u32 {
    1
}

/// Incoming webhook section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HooksConfig {
    /// Shared secret for `Matchday-Signature` verification.
    pub secret: String,
}

impl FileConfig {
    /// Check if the service secret is already hashed (argon2 format).
    pub fn is_service_secret_hashed(&self) -> bool {
        self.service.secret.starts_with("$argon2")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parsing() {
        let toml_str = r#"
[server]

[service]
secret = "moderator-secret"

[football]
api_key = "abc123"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 8080);
        assert_eq!(config.football.base_url, DEFAULT_FOOTBALL_BASE_URL);
        assert_eq!(config.football.default_refresh_minutes, 2);
        assert!(config.push.is_none());
        assert!(config.hooks.is_none());
        assert!(!config.is_service_secret_hashed());
    }

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[service]
secret = "$argon2id$v=19$m=19456,t=2,p=1$abc123"

[football]
api_key = "abc123"
base_url = "http://localhost:9000/"
default_refresh_minutes = 5

[push]
vapid_public_key = "BPub"
vapid_private_key = "priv"
subject = "mailto:ops@example.com"
max_attempts = 3

[hooks]
secret = "hook-secret"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert!(config.is_service_secret_hashed());
        assert_eq!(config.football.default_refresh_minutes, 5);
        let push = config.push.unwrap();
        assert_eq!(push.ttl_seconds, 86_400);
        assert_eq!(push.max_attempts, 3);
        assert_eq!(config.hooks.unwrap().secret, "hook-secret");
    }

    #[test]
    fn test_rewrite_keeps_optional_sections_out() {
        let config = FileConfig {
            server: ServerConfig {
                listen: default_listen_addr(),
            },
            service: ServiceConfig {
                secret: "$argon2id$v=19$m=19456,t=2,p=1$abc123".to_string(),
            },
            football: FootballConfig {
                api_key: "k".to_string(),
                base_url: default_base_url(),
                default_refresh_minutes: 2,
            },
            push: None,
            hooks: None,
        };
        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(!rendered.contains("[push]"));
        let parsed: FileConfig = toml::from_str(&rendered).unwrap();
        assert!(parsed.is_service_secret_hashed());
    }
}

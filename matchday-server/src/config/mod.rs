//! Configuration module for matchday-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables. Also handles service secret hashing.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{
    FootballConfig, HooksConfig, PushConfig, ServerConfig, ServiceConfig, SharedConfig,
};
use matchday_sdk::webpush::VapidSigner;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("password hashing error: {0}")]
    HashError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub service: ServiceConfig,
    pub football: FootballConfig,
    pub push: Option<PushConfig>,
    pub hooks: HooksConfig,
}

impl LoadedConfig {
    /// Convert into a SharedConfig with Arc<RwLock<T>> wrappers.
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig {
            server: Arc::new(RwLock::new(self.server)),
            service: Arc::new(RwLock::new(self.service)),
            football: Arc::new(RwLock::new(self.football)),
            push: Arc::new(RwLock::new(self.push)),
            hooks: Arc::new(RwLock::new(self.hooks)),
        }
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Hash the service secret if it's plaintext (and rewrite the file)
    /// 5. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        let base_url = validate(&file_config)?;

        let secret_hash = if file_config.is_service_secret_hashed() {
            file_config.service.secret.clone()
        } else {
            let hash = hash_secret(&file_config.service.secret)?;
            file_config.service.secret = hash.clone();
            self.rewrite_config(&file_config)?;
            tracing::info!("Service secret hashed and config file updated");
            hash
        };

        Ok(build_loaded_config(file_config, secret_hash, base_url))
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn rewrite_config(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)?;

        // Write atomically: write to temp file, then rename
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }
}

/// Check the sections and return the normalized provider base URL.
fn validate(config: &FileConfig) -> Result<Url, ConfigError> {
    if config.service.secret.is_empty() {
        return Err(ConfigError::ValidationError(
            "service secret must not be empty".to_string(),
        ));
    }
    if config.football.api_key.is_empty() {
        return Err(ConfigError::ValidationError(
            "football api_key must not be empty".to_string(),
        ));
    }
    if config.football.default_refresh_minutes == 0 {
        return Err(ConfigError::ValidationError(
            "football default_refresh_minutes must be at least 1".to_string(),
        ));
    }
    let base_url = football_base_url(&config.football.base_url)?;

    if let Some(push) = &config.push {
        if push.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "push max_attempts must be at least 1".to_string(),
            ));
        }
        if !(push.subject.starts_with("mailto:") || push.subject.starts_with("https:")) {
            return Err(ConfigError::ValidationError(format!(
                "push subject {} must be a mailto: or https: URI",
                push.subject
            )));
        }
        VapidSigner::from_base64_keys(
            &push.vapid_public_key,
            &push.vapid_private_key,
            push.subject.clone(),
        )
        .map_err(|e| ConfigError::ValidationError(format!("invalid VAPID keys: {e}")))?;
    }

    if config.hooks.as_ref().is_some_and(|h| h.secret.is_empty()) {
        return Err(ConfigError::ValidationError(
            "hooks secret must not be empty".to_string(),
        ));
    }
    Ok(base_url)
}

/// Parse the provider base URL so that joining `fixtures` keeps its path.
fn football_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw)
        .map_err(|e| ConfigError::ValidationError(format!("invalid football base_url: {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn hash_secret(plaintext: &str) -> Result<String, ConfigError> {
    use argon2::{
        Argon2, PasswordHasher,
        password_hash::{SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ConfigError::HashError(e.to_string()))
}

fn build_loaded_config(file_config: FileConfig, secret_hash: String, base_url: Url) -> LoadedConfig {
    LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        service: ServiceConfig::new(secret_hash),
        football: FootballConfig {
            api_key: file_config.football.api_key,
            base_url,
            default_refresh_minutes: file_config.football.default_refresh_minutes,
        },
        push: file_config.push.map(|p| PushConfig {
            vapid_public_key: p.vapid_public_key,
            vapid_private_key: p.vapid_private_key,
            subject: p.subject,
            ttl_seconds: p.ttl_seconds,
            max_attempts: p.max_attempts,
        }),
        hooks: HooksConfig {
            secret: file_config
                .hooks
                .map(|h| h.secret.into_bytes().into_boxed_slice()),
        },
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[server]
listen = "127.0.0.1:3000"

[service]
secret = "moderator-secret"

[football]
api_key = "abc123"
base_url = "http://localhost:9000/v3"
"#;

    fn temp_config(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "matchday-{name}-{}.toml",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn load_hashes_plaintext_secret_and_rewrites_file() {
        let path = temp_config("hash", CONFIG);
        let loader = ConfigLoader::new(&path, None);

        let loaded = loader.load().unwrap();
        assert!(loaded.service.verify("moderator-secret"));
        assert!(loaded.push.is_none());
        assert!(loaded.hooks.secret.is_none());
        assert_eq!(loaded.football.base_url.as_str(), "http://localhost:9000/v3/");

        let rewritten = std::fs::read_to_string(&path).unwrap();
        assert!(rewritten.contains("$argon2"));
        assert!(!rewritten.contains("moderator-secret"));

        // a second load keeps the stored hash
        let reloaded = loader.reload().unwrap();
        assert!(reloaded.service.verify("moderator-secret"));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn listen_override_wins() {
        let path = temp_config("listen", CONFIG);
        let addr: SocketAddr = "0.0.0.0:9999".parse().unwrap();
        let loaded = ConfigLoader::new(&path, Some(addr)).load().unwrap();
        assert_eq!(loaded.server.listen, addr);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn invalid_push_section_is_rejected() {
        let content = format!(
            "{CONFIG}\n[push]\nvapid_public_key = \"AAAA\"\nvapid_private_key = \"AAAA\"\nsubject = \"mailto:ops@example.com\"\n"
        );
        let path = temp_config("push", &content);
        let result = ConfigLoader::new(&path, None).load();
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let url = football_base_url("https://v3.football.api-sports.io").unwrap();
        assert_eq!(url.join("fixtures").unwrap().as_str(), "https://v3.football.api-sports.io/fixtures");
        let url = football_base_url("http://proxy.local/api").unwrap();
        assert_eq!(url.join("fixtures").unwrap().as_str(), "http://proxy.local/api/fixtures");
        assert!(football_base_url("not a url").is_err());
    }
}

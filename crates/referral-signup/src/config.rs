//! Configuration for the signup service.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Signup flow configuration
    #[serde(default)]
    pub signup: SignupConfig,

    /// SlickText configuration
    #[serde(default)]
    pub slicktext: SlickTextConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupConfig {
    /// Base of the shareable link; `?ref=<code>` is appended
    #[serde(default = "default_referral_base_url")]
    pub referral_base_url: String,

    /// Static page served on `GET /signup`
    #[serde(default = "default_static_page")]
    pub static_page: PathBuf,

    /// How many referral codes to try before giving up on a signup
    #[serde(default = "default_code_attempts")]
    pub code_attempts: u32,

    /// Require exactly ten national digits after the +1 prefix
    #[serde(default)]
    pub strict_phone_validation: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlickTextConfig {
    /// Contacts endpoint of the brand list
    #[serde(default = "default_slicktext_base_url")]
    pub base_url: String,

    /// API public key; notifications are disabled when unset
    #[serde(default)]
    pub public_key: Option<String>,

    /// List the messages are sent through
    #[serde(default = "default_list_id")]
    pub list_id: u64,

    /// Per-request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Pending notifications held before new ones are dropped
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for SignupConfig {
    fn default() -> Self {
        Self {
            referral_base_url: default_referral_base_url(),
            static_page: default_static_page(),
            code_attempts: default_code_attempts(),
            strict_phone_validation: false,
        }
    }
}

impl Default for SlickTextConfig {
    fn default() -> Self {
        Self {
            base_url: default_slicktext_base_url(),
            public_key: None,
            list_id: default_list_id(),
            timeout: default_timeout(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    3000
}

fn default_database_url() -> String {
    "sqlite://referrals.db".into()
}

fn default_max_connections() -> u32 {
    5
}

fn default_referral_base_url() -> String {
    "https://referral.gamifyHQ.com/signup".into()
}

fn default_static_page() -> PathBuf {
    PathBuf::from("public/index.html")
}

fn default_code_attempts() -> u32 {
    5
}

fn default_slicktext_base_url() -> String {
    "https://dev.slicktext.com/v1/brands/994/lists/contacts".into()
}

fn default_list_id() -> u64 {
    2645
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_queue_capacity() -> usize {
    256
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    // Parsing would turn numeric keys and phone-like values into numbers.
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_deployment() {
        let config: Config = serde_json::from_str("{}").unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.url, "sqlite://referrals.db");
        assert_eq!(
            config.signup.referral_base_url,
            "https://referral.gamifyHQ.com/signup"
        );
        assert_eq!(config.signup.code_attempts, 5);
        assert!(!config.signup.strict_phone_validation);
        assert_eq!(config.slicktext.list_id, 2645);
        assert!(config.slicktext.public_key.is_none());
        assert_eq!(config.slicktext.timeout, Duration::from_secs(10));
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_timeout_uses_humantime() {
        let config: SlickTextConfig =
            serde_json::from_str(r#"{"timeout": "2s 500ms", "list_id": 7}"#).unwrap();

        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert_eq!(config.list_id, 7);
    }
}

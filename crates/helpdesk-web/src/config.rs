//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Web server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Seed missing default settings at startup.
    pub seed_settings: bool,
    /// How long a setting read stays cached.
    pub settings_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `HELPDESK_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:helpdesk.db?mode=rwc` |
    /// | `HELPDESK_SEED_SETTINGS` | Insert missing default settings on start | `true` |
    /// | `HELPDESK_SETTINGS_TTL_SECS` | Seconds a setting read stays cached | `60` |
    ///
    /// Mail is configured separately through the `MAIL_*` variables read by
    /// `ticket_mailer::SmtpConfig::from_env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("HELPDESK_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("SQLITE_PATH")
            .unwrap_or_else(|_| "sqlite:helpdesk.db?mode=rwc".to_string());

        let seed_settings = match env::var("HELPDESK_SEED_SETTINGS") {
            Ok(value) => parse_bool(&value).ok_or(ConfigError::InvalidSeedFlag(value))?,
            Err(_) => true,
        };

        let settings_ttl = match env::var("HELPDESK_SETTINGS_TTL_SECS") {
            Ok(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidSettingsTtl(value))?,
            Err(_) => helpdesk::DEFAULT_TTL,
        };

        Ok(Self {
            addr,
            database_url,
            seed_settings,
            settings_ttl,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid HELPDESK_ADDR format")]
    InvalidAddr,

    #[error("Invalid HELPDESK_SEED_SETTINGS value: {0}")]
    InvalidSeedFlag(String),

    #[error("Invalid HELPDESK_SETTINGS_TTL_SECS value: {0}")]
    InvalidSettingsTtl(String),
}

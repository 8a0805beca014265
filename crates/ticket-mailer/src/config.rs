use secrecy::{ExposeSecret, SecretString};
use std::env;

use crate::MailError;

/// Configuration for the SMTP relay used to deliver notifications.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP host
    pub host: String,
    /// SMTP port (default: 587)
    pub port: u16,
    /// SMTP login
    pub username: String,
    /// SMTP password
    password: SecretString,
    /// Envelope sender address (default: the login)
    pub from_address: String,
    /// Display name of the sender (default: "Helpdesk")
    pub from_name: String,
}

impl SmtpConfig {
    /// Create a new configuration with explicit values.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let username = username.into();
        Self {
            host: host.into(),
            port,
            from_address: username.clone(),
            username,
            password: SecretString::from(password.into()),
            from_name: "Helpdesk".to_string(),
        }
    }

    /// Whether an SMTP host has been configured in the environment.
    pub fn is_configured() -> bool {
        env::var("MAIL_SMTP_HOST").is_ok()
    }

    /// Create configuration from environment variables.
    ///
    /// Required:
    /// - `MAIL_SMTP_HOST` - SMTP relay host
    /// - `MAIL_USERNAME` - SMTP login
    /// - `MAIL_PASSWORD` - SMTP password
    ///
    /// Optional (with defaults):
    /// - `MAIL_SMTP_PORT` - Default: 587
    /// - `MAIL_FROM_ADDRESS` - Default: `MAIL_USERNAME`
    /// - `MAIL_FROM_NAME` - Default: Helpdesk
    pub fn from_env() -> Result<Self, MailError> {
        let host = env::var("MAIL_SMTP_HOST")
            .map_err(|_| MailError::MissingEnvVar("MAIL_SMTP_HOST".to_string()))?;

        let port = env::var("MAIL_SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse::<u16>()
            .map_err(|e| MailError::Config(format!("Invalid MAIL_SMTP_PORT: {}", e)))?;

        let username = env::var("MAIL_USERNAME")
            .map_err(|_| MailError::MissingEnvVar("MAIL_USERNAME".to_string()))?;

        let password = env::var("MAIL_PASSWORD")
            .map_err(|_| MailError::MissingEnvVar("MAIL_PASSWORD".to_string()))?;

        let from_address = env::var("MAIL_FROM_ADDRESS").unwrap_or_else(|_| username.clone());
        let from_name = env::var("MAIL_FROM_NAME").unwrap_or_else(|_| "Helpdesk".to_string());

        Ok(Self {
            host,
            port,
            username,
            password: SecretString::from(password),
            from_address,
            from_name,
        })
    }

    /// Get the password (exposes the secret).
    pub(crate) fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// Builder method to set the sender address and display name.
    pub fn with_from(mut self, address: impl Into<String>, name: impl Into<String>) -> Self {
        self.from_address = address.into();
        self.from_name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults_sender_to_login() {
        let config = SmtpConfig::new("smtp.example.com", 587, "desk@example.com", "secret");
        assert_eq!(config.from_address, "desk@example.com");
        assert_eq!(config.from_name, "Helpdesk");
        assert_eq!(config.password(), "secret");
    }

    #[test]
    fn test_with_from() {
        let config = SmtpConfig::new("smtp.example.com", 587, "login", "secret")
            .with_from("support@example.com", "Support");
        assert_eq!(config.from_address, "support@example.com");
        assert_eq!(config.from_name, "Support");
        assert_eq!(config.username, "login");
    }

    #[test]
    fn test_debug_hides_password() {
        let config = SmtpConfig::new("smtp.example.com", 587, "login", "hunter2");
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}

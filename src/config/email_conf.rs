use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{required_var, var_or, ConfigError};

/// SMTP settings for outgoing notification mail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    /// Wrap the connection in TLS at all
    pub use_tls: bool,
    /// Upgrade with STARTTLS instead of implicit TLS
    pub use_starttls: bool,
    pub from_email: String,
    /// Display name on the From header
    pub from_name: String,
    pub connection_timeout_secs: u64,
    /// Upper bound on messages in flight during a bulk send
    pub max_concurrent_sends: usize,
}

impl EmailConfig {
    /// SMTP_HOST, SMTP_USERNAME, SMTP_PASSWORD and SMTP_FROM_EMAIL are required.
    /// Everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading email configuration from environment variables");

        let config = EmailConfig {
            smtp_host: required_var("SMTP_HOST")?,
            smtp_port: var_or("SMTP_PORT", 587)?,
            smtp_username: required_var("SMTP_USERNAME")?,
            smtp_password: required_var("SMTP_PASSWORD")?,
            use_tls: var_or("SMTP_USE_TLS", true)?,
            use_starttls: var_or("SMTP_USE_STARTTLS", true)?,
            from_email: required_var("SMTP_FROM_EMAIL")?,
            from_name: var_or("SMTP_FROM_NAME", "Alumni Network".to_string())?,
            connection_timeout_secs: var_or("SMTP_CONNECTION_TIMEOUT", 30)?,
            max_concurrent_sends: var_or("SMTP_MAX_CONCURRENT_SENDS", 8)?,
        };
        debug!(host = %config.smtp_host, port = config.smtp_port, "SMTP settings read (password redacted)");

        config.validate()?;
        Ok(config)
    }

    /// Local mail catcher settings, no TLS
    pub fn from_test_env() -> Self {
        EmailConfig {
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_username: "test".to_string(),
            smtp_password: "test".to_string(),
            use_tls: false,
            use_starttls: false,
            from_email: "test@example.com".to_string(),
            from_name: "Test App".to_string(),
            connection_timeout_secs: 10,
            max_concurrent_sends: 2,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| Err(ConfigError::ValidationError(message.to_string()));

        if self.smtp_host.trim().is_empty() {
            return invalid("SMTP host cannot be empty");
        }
        if self.smtp_port == 0 {
            return invalid("SMTP port cannot be 0");
        }
        if self.smtp_username.is_empty() || self.smtp_password.is_empty() {
            return invalid("SMTP credentials cannot be empty");
        }
        if !self.from_email.contains('@') {
            return invalid("Invalid from email format");
        }
        if self.connection_timeout_secs == 0 || self.max_concurrent_sends == 0 {
            return invalid("SMTP timeout and concurrency must be greater than 0");
        }
        Ok(())
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        EmailConfig {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            use_tls: true,
            use_starttls: true,
            from_email: "noreply@example.com".to_string(),
            from_name: "Alumni Network".to_string(),
            connection_timeout_secs: 30,
            max_concurrent_sends: 8,
        }
    }
}

use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, info};

use crate::config::{var_or, ConfigError};

/// Public site settings served by the admin settings endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    pub site_name: String,
    pub site_description: String,
    pub contact_email: String,
    pub support_phone: Option<String>,
    pub default_currency: String,
    pub max_upload_mb: u32,
}

impl Default for SiteSettings {
    fn default() -> Self {
        SiteSettings {
            site_name: "Alumni Network".to_string(),
            site_description: "Connecting graduates, events and opportunities".to_string(),
            contact_email: "contact@alumni.local".to_string(),
            support_phone: None,
            default_currency: "USD".to_string(),
            max_upload_mb: 10,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Allowed browser origin for the admin dashboard, `None` allows any
    pub cors_origin: Option<String>,
    pub site: SiteSettings,
}

impl AppConfig {
    /// Load server configuration from environment variables
    ///
    /// Expected environment variables:
    /// - APP_HOST (defaults to 127.0.0.1)
    /// - APP_PORT (defaults to 8080)
    /// - CORS_ORIGIN (optional)
    /// - SITE_NAME, SITE_DESCRIPTION, CONTACT_EMAIL, SUPPORT_PHONE, DEFAULT_CURRENCY, MAX_UPLOAD_MB
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading application configuration from environment variables");
        let defaults = SiteSettings::default();

        let host = var_or("APP_HOST", "127.0.0.1".to_string())?;
        let port = var_or("APP_PORT", 8080)?;

        let cors_origin = env::var("CORS_ORIGIN").ok().filter(|o| !o.trim().is_empty());
        debug!("CORS origin: {:?}", cors_origin);

        let site = SiteSettings {
            site_name: var_or("SITE_NAME", defaults.site_name)?,
            site_description: var_or("SITE_DESCRIPTION", defaults.site_description)?,
            contact_email: var_or("CONTACT_EMAIL", defaults.contact_email)?,
            support_phone: env::var("SUPPORT_PHONE").ok(),
            default_currency: var_or("DEFAULT_CURRENCY", defaults.default_currency)?,
            max_upload_mb: var_or("MAX_UPLOAD_MB", defaults.max_upload_mb)?,
        };

        let config = AppConfig { host, port, cors_origin, site };
        config.validate()?;
        info!("Application configuration loaded successfully");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::ValidationError("APP_HOST cannot be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::ValidationError("APP_PORT must be greater than 0".to_string()));
        }
        if self.site.default_currency.len() != 3 {
            return Err(ConfigError::ValidationError(
                "DEFAULT_CURRENCY must be a 3-letter ISO code".to_string(),
            ));
        }
        if !self.site.contact_email.contains('@') {
            return Err(ConfigError::ValidationError("Invalid CONTACT_EMAIL format".to_string()));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origin: None,
            site: SiteSettings::default(),
        }
    }
}

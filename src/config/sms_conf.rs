use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;

/// HTTP SMS gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    /// Endpoint accepting `POST {to, from, message}` JSON bodies
    pub gateway_url: String,
    /// Bearer key sent to the gateway
    pub api_key: String,
    /// Sender id shown on handsets
    pub sender_id: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    pub max_concurrent_sends: usize,
}

impl SmsConfig {
    /// Load SMS gateway configuration
    ///
    /// Expected environment variables:
    /// - SMS_GATEWAY_URL (required)
    /// - SMS_API_KEY (required)
    /// - SMS_SENDER_ID (defaults to "ALUMNI")
    /// - SMS_TIMEOUT (defaults to 10 seconds)
    /// - SMS_MAX_CONCURRENT_SENDS (defaults to 8)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading SMS configuration from environment variables");

        let gateway_url = env::var("SMS_GATEWAY_URL").map_err(|_| {
            error!("SMS_GATEWAY_URL environment variable not found");
            ConfigError::EnvVarNotFound("SMS_GATEWAY_URL".to_string())
        })?;
        debug!("SMS gateway: {}", gateway_url);

        let api_key = env::var("SMS_API_KEY")
            .map_err(|_| ConfigError::EnvVarNotFound("SMS_API_KEY".to_string()))?;

        let sender_id = env::var("SMS_SENDER_ID").unwrap_or_else(|_| {
            warn!("SMS_SENDER_ID not set, using default: ALUMNI");
            "ALUMNI".to_string()
        });

        let timeout_secs = env::var("SMS_TIMEOUT")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u64>()
            .map_err(|e| ConfigError::ParseError(format!("SMS_TIMEOUT: {}", e)))?;

        let max_concurrent_sends = env::var("SMS_MAX_CONCURRENT_SENDS")
            .unwrap_or_else(|_| "8".to_string())
            .parse::<usize>()
            .map_err(|e| ConfigError::ParseError(format!("SMS_MAX_CONCURRENT_SENDS: {}", e)))?;

        let config = SmsConfig {
            gateway_url,
            api_key,
            sender_id,
            timeout_secs,
            max_concurrent_sends,
        };
        config.validate()?;
        info!("SMS configuration loaded successfully");
        Ok(config)
    }

    pub fn from_test_env() -> Self {
        SmsConfig {
            gateway_url: "http://localhost:9099/sms".to_string(),
            api_key: "test-key".to_string(),
            sender_id: "TEST".to_string(),
            timeout_secs: 2,
            max_concurrent_sends: 2,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.gateway_url.starts_with("http://") || self.gateway_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(
                "SMS_GATEWAY_URL must be an http(s) URL".to_string(),
            ));
        }
        if self.api_key.is_empty() {
            return Err(ConfigError::ValidationError("SMS_API_KEY cannot be empty".to_string()));
        }
        if self.sender_id.is_empty() || self.sender_id.len() > 11 {
            return Err(ConfigError::ValidationError(
                "SMS_SENDER_ID must be 1 to 11 characters".to_string(),
            ));
        }
        if self.timeout_secs == 0 || self.max_concurrent_sends == 0 {
            return Err(ConfigError::ValidationError(
                "SMS timeout and concurrency must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, instrument};

use crate::config::SmsConfig;

#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Invalid phone number: {0}")]
    InvalidNumber(String),
    #[error("Gateway request failed: {0}")]
    RequestFailed(String),
    #[error("Gateway rejected message with status {0}")]
    Rejected(u16),
}

#[derive(Debug, Serialize)]
struct OutboundSms<'a> {
    to: &'a str,
    from: &'a str,
    message: &'a str,
}

/// Client for a JSON-over-HTTP SMS gateway
pub struct SmsGateway {
    pub config: SmsConfig,
    client: Client,
}

impl SmsGateway {
    pub fn new(config: SmsConfig) -> Result<Self, SmsError> {
        config
            .validate()
            .map_err(|e| SmsError::ConfigError(e.to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SmsError::ConfigError(e.to_string()))?;
        Ok(SmsGateway { config, client })
    }

    #[instrument(skip(self, message))]
    pub async fn send_sms(&self, to: &str, message: &str) -> Result<(), SmsError> {
        let to = normalize_phone(to).ok_or_else(|| SmsError::InvalidNumber(to.to_string()))?;
        let body = OutboundSms {
            to: &to,
            from: &self.config.sender_id,
            message,
        };

        let response = self
            .client
            .post(&self.config.gateway_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("SMS gateway request failed: {}", e);
                SmsError::RequestFailed(e.to_string())
            })?;

        if !response.status().is_success() {
            error!("SMS gateway rejected message: {}", response.status());
            return Err(SmsError::Rejected(response.status().as_u16()));
        }
        debug!("SMS accepted by gateway");
        Ok(())
    }
}

/// Strips spacing and punctuation; keeps a leading `+`. Returns `None` for
/// anything that is not 7 to 15 digits.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let plus = trimmed.starts_with('+');
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    let allowed = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')' | '.'));
    if !allowed || !(7..=15).contains(&digits.len()) {
        return None;
    }
    Some(if plus { format!("+{}", digits) } else { digits })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("+252 63 123-4567").as_deref(), Some("+252631234567"));
        assert_eq!(normalize_phone("(063) 1234567").as_deref(), Some("0631234567"));
        assert_eq!(normalize_phone("12345"), None);
        assert_eq!(normalize_phone("call me"), None);
    }

    #[test]
    fn test_gateway_rejects_bad_config() {
        let mut config = SmsConfig::from_test_env();
        config.api_key = String::new();
        assert!(SmsGateway::new(config).is_err());
    }
}

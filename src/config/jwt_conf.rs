use std::env;
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;

/// Shortest secret accepted for HS256 signing
const MIN_SECRET_LEN: usize = 32;

/// JWT configuration structure
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// JWT secret key for signing tokens
    pub jwt_secret: String,
    /// Access token expiration time in minutes
    pub access_token_expiration: i64,
    /// Refresh token expiration time in minutes
    pub refresh_token_expiration: i64,
    /// JWT issuer (optional)
    pub jwt_issuer: Option<String>,
    /// JWT audience (optional)
    pub jwt_audience: Option<String>,
}

fn load(prefix: &str) -> Result<JwtConfig, ConfigError> {
    let key = |name: &str| format!("{}{}", prefix, name);

    let secret_var = key("JWT_SECRET");
    let jwt_secret = env::var(&secret_var).map_err(|_| {
        error!("{} environment variable not found", secret_var);
        ConfigError::EnvVarNotFound(secret_var.clone())
    })?;
    debug!("JWT secret loaded (length: {} chars)", jwt_secret.len());

    let minutes = |name: String, default: &str| -> Result<i64, ConfigError> {
        env::var(&name)
            .unwrap_or_else(|_| {
                warn!("{} not set, using default: {} minutes", name, default);
                default.to_string()
            })
            .parse::<i64>()
            .map_err(|e| {
                error!("Invalid {} value: {}", name, e);
                ConfigError::ParseError(format!("{}: {}", name, e))
            })
    };

    let access_token_expiration = minutes(key("JWT_ACCESS_TOKEN_EXPIRY"), "60")?;
    let refresh_token_expiration = minutes(key("JWT_REFRESH_TOKEN_EXPIRY"), "10080")?;

    let config = JwtConfig {
        jwt_secret,
        access_token_expiration,
        refresh_token_expiration,
        jwt_issuer: env::var(key("JWT_ISSUER")).ok(),
        jwt_audience: env::var(key("JWT_AUDIENCE")).ok(),
    };
    config.validate()?;
    Ok(config)
}

impl JwtConfig {
    /// Load JWT configuration from environment variables
    ///
    /// Expected environment variables:
    /// - JWT_SECRET: Secret key for signing JWT tokens (required, 32+ chars)
    /// - JWT_ACCESS_TOKEN_EXPIRY: Access token expiration in minutes (defaults to 60)
    /// - JWT_REFRESH_TOKEN_EXPIRY: Refresh token expiration in minutes (defaults to 10080 = 1 week)
    /// - JWT_ISSUER / JWT_AUDIENCE: optional
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading JWT configuration from environment variables");
        let config = load("")?;
        info!("JWT configuration loaded successfully");
        Ok(config)
    }

    /// Same as [`JwtConfig::from_env`] but reads `TEST_` prefixed variables
    pub fn from_test_env() -> Result<Self, ConfigError> {
        info!("Loading JWT configuration from test environment variables");
        load("TEST_")
    }

    /// Validate the JWT configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            error!("JWT secret is too short (minimum {} characters required)", MIN_SECRET_LEN);
            return Err(ConfigError::ValidationError(format!(
                "JWT secret must be at least {} characters long",
                MIN_SECRET_LEN
            )));
        }

        if self.access_token_expiration <= 0 {
            return Err(ConfigError::ValidationError(
                "Access token expiration must be greater than 0".to_string(),
            ));
        }

        if self.refresh_token_expiration <= 0 {
            return Err(ConfigError::ValidationError(
                "Refresh token expiration must be greater than 0".to_string(),
            ));
        }

        if self.access_token_expiration >= self.refresh_token_expiration {
            warn!("Access token expiration is greater than or equal to refresh token expiration");
        }

        Ok(())
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        JwtConfig {
            jwt_secret: "test_secret_key_for_jwt_testing_should_be_long_enough_for_security_purposes".to_string(),
            access_token_expiration: 60,
            refresh_token_expiration: 10080,
            jwt_issuer: Some("alumni-backend-test".to_string()),
            jwt_audience: Some("alumni-backend-users".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(JwtConfig::default().validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = JwtConfig::default();
        config.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_expiry_rejected() {
        let mut config = JwtConfig::default();
        config.access_token_expiration = 0;
        assert!(config.validate().is_err());

        let mut config = JwtConfig::default();
        config.refresh_token_expiration = -5;
        assert!(config.validate().is_err());
    }
}

use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, info};

use crate::config::{required_var, var_or, ConfigError};

/// Connection settings for the shared MongoDB client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    /// Credentials applied on top of the URI when both are present
    pub username: Option<String>,
    pub password: Option<String>,
    pub pool_size: u32,
    /// Seconds
    pub connection_timeout_secs: u64,
}

impl MongoConfig {
    /// Reads `MONGO_URI` and `MONGO_DATABASE` (required), `MONGO_USERNAME` and
    /// `MONGO_PASSWORD` (optional), `MONGO_POOL_SIZE` (10) and
    /// `MONGO_CONNECTION_TIMEOUT` (5 seconds).
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading MongoDB configuration from environment variables");

        let config = MongoConfig {
            uri: required_var("MONGO_URI")?,
            database: required_var("MONGO_DATABASE")?,
            username: env::var("MONGO_USERNAME").ok(),
            password: env::var("MONGO_PASSWORD").ok(),
            pool_size: var_or("MONGO_POOL_SIZE", 10)?,
            connection_timeout_secs: var_or("MONGO_CONNECTION_TIMEOUT", 5)?,
        };
        debug!(
            database = %config.database,
            credentials = config.username.is_some() && config.password.is_some(),
            "MongoDB settings read"
        );

        config.validate()?;
        Ok(config)
    }

    pub fn from_test_env() -> Self {
        MongoConfig {
            database: "alumni_test".to_string(),
            pool_size: 2,
            connection_timeout_secs: 2,
            ..MongoConfig::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let problem = if self.uri.trim().is_empty() {
            Some("MongoDB URI cannot be empty")
        } else if self.database.trim().is_empty() {
            Some("MongoDB database cannot be empty")
        } else if self.pool_size == 0 {
            Some("MongoDB pool size must be greater than 0")
        } else if self.connection_timeout_secs == 0 {
            Some("MongoDB connection timeout must be greater than 0")
        } else if matches!(self.username.as_deref(), Some("")) || matches!(self.password.as_deref(), Some("")) {
            Some("MongoDB credentials cannot be empty if set")
        } else {
            None
        };

        match problem {
            Some(message) => Err(ConfigError::ValidationError(message.to_string())),
            None => Ok(()),
        }
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "alumni_network".to_string(),
            username: None,
            password: None,
            pool_size: 10,
            connection_timeout_secs: 5,
        }
    }
}

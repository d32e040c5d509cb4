use serde::{Deserialize, Serialize};

use crate::config::{required_var, ConfigError};
use crate::util::password::MIN_PASSWORD_LEN;

/// Credentials of the first administrator, created at startup when missing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUserConfig {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl AdminUserConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = AdminUserConfig {
            first_name: required_var("ADMIN_FIRST_NAME")?,
            last_name: required_var("ADMIN_LAST_NAME")?,
            email: required_var("ADMIN_EMAIL")?,
            password: required_var("ADMIN_PASSWORD")?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.email.contains('@') {
            return Err(ConfigError::ValidationError("Invalid ADMIN_EMAIL format".to_string()));
        }
        if (self.password.chars().count() as u64) < MIN_PASSWORD_LEN {
            return Err(ConfigError::ValidationError(format!(
                "ADMIN_PASSWORD must be at least {} characters long",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}

pub mod admin_user_conf;
pub mod app_conf;
pub mod email_conf;
pub mod jwt_conf;
pub mod mongo_conf;
pub mod sms_conf;

pub use admin_user_conf::AdminUserConfig;
pub use app_conf::{AppConfig, SiteSettings};
pub use email_conf::EmailConfig;
pub use jwt_conf::JwtConfig;
pub use mongo_conf::MongoConfig;
pub use sms_conf::SmsConfig;

/// Common configuration error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Reads a variable that has no sensible fallback.
pub(crate) fn required_var(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| {
        tracing::error!("{} environment variable not found", name);
        ConfigError::EnvVarNotFound(name.to_string())
    })
}

/// Parses `name`, falling back to `default` when it is unset.
pub(crate) fn var_or<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| {
            tracing::error!("Invalid {} value: {}", name, e);
            ConfigError::ParseError(format!("{}: {}", name, e))
        }),
        Err(_) => {
            tracing::warn!("{} not set, using default: {}", name, default);
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_or_falls_back_and_parses() {
        std::env::remove_var("ALUMNI_CFG_UNSET_PORT");
        assert_eq!(var_or("ALUMNI_CFG_UNSET_PORT", 8080u16).unwrap(), 8080);

        std::env::set_var("ALUMNI_CFG_PORT", " 9090 ");
        assert_eq!(var_or("ALUMNI_CFG_PORT", 8080u16).unwrap(), 9090);

        std::env::set_var("ALUMNI_CFG_BAD_PORT", "eighty");
        assert!(matches!(var_or("ALUMNI_CFG_BAD_PORT", 8080u16), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_required_var_reports_name() {
        std::env::remove_var("ALUMNI_CFG_MISSING");
        match required_var("ALUMNI_CFG_MISSING") {
            Err(ConfigError::EnvVarNotFound(name)) => assert_eq!(name, "ALUMNI_CFG_MISSING"),
            other => panic!("expected EnvVarNotFound, got {:?}", other),
        }
    }
}

//! Configuration validation.
//!
//! Semantic checks that serde cannot express. Returns every problem found,
//! not just the first one.

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("database.url is empty")]
    MissingDatabaseUrl,

    #[error("database.url '{0}' is not a valid URL")]
    InvalidDatabaseUrl(String),

    #[error("database.{0} must be greater than zero")]
    ZeroDatabaseSetting(&'static str),

    #[error("database.base_delay_ms ({base}) exceeds database.max_delay_ms ({max})")]
    BackoffInverted { base: u64, max: u64 },

    #[error("database.max_delay_ms ({delay}) exceeds database.max_total_ms ({total})")]
    DelayExceedsBudget { delay: u64, total: u64 },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("cors.allowed_origins entry '{0}' is not a valid origin")]
    InvalidOrigin(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a loaded configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let db = &config.database;

    if db.url.trim().is_empty() {
        errors.push(ValidationError::MissingDatabaseUrl);
    } else if Url::parse(&db.url).is_err() {
        errors.push(ValidationError::InvalidDatabaseUrl(db.url.clone()));
    }

    for (name, value) in [
        ("max_attempts", u64::from(db.max_attempts)),
        ("connect_timeout_ms", db.connect_timeout_ms),
        ("max_total_ms", db.max_total_ms),
        ("close_timeout_ms", db.close_timeout_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroDatabaseSetting(name));
        }
    }

    if db.base_delay_ms > db.max_delay_ms {
        errors.push(ValidationError::BackoffInverted {
            base: db.base_delay_ms,
            max: db.max_delay_ms,
        });
    }

    if db.max_delay_ms > db.max_total_ms {
        errors.push(ValidationError::DelayExceedsBudget {
            delay: db.max_delay_ms,
            total: db.max_total_ms,
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    for origin in &config.cors.allowed_origins {
        let valid = Url::parse(origin)
            .map(|u| u.host_str().is_some())
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::InvalidOrigin(origin.clone()));
        }
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.database.url = String::new();
        config.database.max_attempts = 0;
        config.timeouts.request_secs = 0;
        config.cors.allowed_origins.push("not an origin".into());

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::MissingDatabaseUrl));
        assert!(errors.contains(&ValidationError::ZeroDatabaseSetting("max_attempts")));
        assert!(errors.contains(&ValidationError::ZeroRequestTimeout));
        assert!(errors.contains(&ValidationError::InvalidOrigin("not an origin".into())));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_inverted_backoff() {
        let mut config = GatewayConfig::default();
        config.database.base_delay_ms = 10_000;
        config.database.max_delay_ms = 100;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::BackoffInverted { base: 10_000, max: 100 }]
        );
    }

    #[test]
    fn test_max_delay_bounded_by_total_budget() {
        let mut config = GatewayConfig::default();
        config.database.max_delay_ms = u64::MAX;
        config.database.max_total_ms = 60_000;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::DelayExceedsBudget {
                delay: u64::MAX,
                total: 60_000
            }]
        );
    }
}

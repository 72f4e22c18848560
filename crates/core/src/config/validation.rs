//! Configuration validation rules.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `api_base_url` or `app_origin` are not absolute URLs
    /// - a partition capacity bound is 0
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` or `version_tag` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if url::Url::parse(&self.api_base_url).is_err() {
            return Err(ConfigError::Invalid {
                field: "api_base_url".into(),
                reason: "must be an absolute URL".into(),
            });
        }
        if url::Url::parse(&self.app_origin).is_err() {
            return Err(ConfigError::Invalid {
                field: "app_origin".into(),
                reason: "must be an absolute URL".into(),
            });
        }

        if self.image_max_entries == 0 {
            return Err(ConfigError::Invalid {
                field: "image_max_entries".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.api_max_entries == 0 {
            return Err(ConfigError::Invalid {
                field: "api_max_entries".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }
        if self.version_tag.is_empty() {
            return Err(ConfigError::Invalid { field: "version_tag".into(), reason: "must not be empty".into() });
        }

        if self.precache.is_empty() {
            tracing::warn!("precache list is empty; navigations will have no offline fallback");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_bad_api_base() {
        let config = AppConfig { api_base_url: "not a url".into(), ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field, .. }) if field == "api_base_url"
        ));
    }

    #[test]
    fn test_validate_zero_capacity() {
        let config = AppConfig { image_max_entries: 0, ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field, .. }) if field == "image_max_entries"
        ));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        assert!(config.validate().is_err());

        let config = AppConfig { timeout_ms: 301_000, ..Default::default() };
        assert!(config.validate().is_err());

        let config = AppConfig { timeout_ms: 100, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_version_tag() {
        let config = AppConfig { version_tag: String::new(), ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field, .. }) if field == "version_tag"
        ));
    }
}

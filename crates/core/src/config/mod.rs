//! Application configuration with layered loading.
//!
//! Configuration is consumed from the surrounding application: API base
//! origin, push key material, the precache file list, and per-partition
//! capacity/freshness bounds. Loaded with figment from multiple sources:
//!
//! 1. Environment variables (DRIFT_*)
//! 2. TOML config file (if DRIFT_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Worker configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (DRIFT_*)
/// 2. TOML config file (if DRIFT_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote API base, used both for request classification and as the
    /// push subscription endpoint root.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Origin the app shell is served from; precache paths resolve
    /// against it.
    #[serde(default = "default_app_origin")]
    pub app_origin: String,

    /// Version tag embedded in partition names, minted at build/deploy time.
    #[serde(default = "default_version_tag")]
    pub version_tag: String,

    /// Push service public key material (VAPID). Required only when the
    /// push channel subscribes.
    #[serde(default)]
    pub vapid_public_key: Option<String>,

    /// Paths precached into the static partition at install.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Precached document served to navigations.
    #[serde(default = "default_app_shell")]
    pub app_shell: String,

    /// Precached fallback page when the app shell is unreachable.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// URL path fragments that mark a request as a photo fetch.
    #[serde(default = "default_photo_path_segments")]
    pub photo_path_segments: Vec<String>,

    /// Capacity bound for the image partition.
    #[serde(default = "default_image_max_entries")]
    pub image_max_entries: usize,

    /// Freshness bound for the image partition, in seconds.
    #[serde(default = "default_image_max_age_secs")]
    pub image_max_age_secs: u64,

    /// Capacity bound for the API partition.
    #[serde(default = "default_api_max_entries")]
    pub api_max_entries: usize,

    /// Freshness bound for the API partition, in seconds. Short by design:
    /// API data is volatile, so minutes rather than days.
    #[serde(default = "default_api_max_age_secs")]
    pub api_max_age_secs: u64,

    /// Path to the partition SQLite database.
    #[serde(default = "default_cache_db_path")]
    pub cache_db_path: PathBuf,

    /// Path to the content SQLite database.
    #[serde(default = "default_content_db_path")]
    pub content_db_path: PathBuf,

    /// User-Agent string for outbound requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Network request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_api_base_url() -> String {
    "https://story-api.example.com/v1".into()
}

fn default_app_origin() -> String {
    "http://localhost:8080".into()
}

fn default_version_tag() -> String {
    "v1".into()
}

fn default_precache() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/app.css",
        "/app.js",
        "/favicon.png",
        "/manifest.json",
        "/offline.html",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_app_shell() -> String {
    "/index.html".into()
}

fn default_offline_page() -> String {
    "/offline.html".into()
}

fn default_photo_path_segments() -> Vec<String> {
    vec!["story-photo".into(), "photoUrl".into()]
}

fn default_image_max_entries() -> usize {
    50
}

fn default_image_max_age_secs() -> u64 {
    30 * 24 * 60 * 60 // 30 days
}

fn default_api_max_entries() -> usize {
    50
}

fn default_api_max_age_secs() -> u64 {
    300 // 5 minutes
}

fn default_cache_db_path() -> PathBuf {
    PathBuf::from("./driftcache-partitions.sqlite")
}

fn default_content_db_path() -> PathBuf {
    PathBuf::from("./driftcache-content.sqlite")
}

fn default_user_agent() -> String {
    "driftcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            app_origin: default_app_origin(),
            version_tag: default_version_tag(),
            vapid_public_key: None,
            precache: default_precache(),
            app_shell: default_app_shell(),
            offline_page: default_offline_page(),
            photo_path_segments: default_photo_path_segments(),
            image_max_entries: default_image_max_entries(),
            image_max_age_secs: default_image_max_age_secs(),
            api_max_entries: default_api_max_entries(),
            api_max_age_secs: default_api_max_age_secs(),
            cache_db_path: default_cache_db_path(),
            content_db_path: default_content_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn image_max_age(&self) -> Duration {
        Duration::from_secs(self.image_max_age_secs)
    }

    pub fn api_max_age(&self) -> Duration {
        Duration::from_secs(self.api_max_age_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be read or validation fails
    /// after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("DRIFT_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("DRIFT_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check if push key material is available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the VAPID public key is not set.
    pub fn require_vapid_public_key(&self) -> Result<&str, ConfigError> {
        self.vapid_public_key.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "vapid_public_key".into(),
            hint: "Set DRIFT_VAPID_PUBLIC_KEY environment variable".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.version_tag, "v1");
        assert_eq!(config.app_shell, "/index.html");
        assert_eq!(config.offline_page, "/offline.html");
        assert_eq!(config.image_max_entries, 50);
        assert_eq!(config.api_max_age_secs, 300);
        assert_eq!(config.timeout_ms, 20_000);
        assert!(config.vapid_public_key.is_none());
        assert!(config.precache.contains(&"/offline.html".to_string()));
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
        assert_eq!(config.api_max_age(), Duration::from_secs(300));
    }

    #[test]
    fn test_require_vapid_key_missing() {
        let config = AppConfig::default();
        assert!(matches!(
            config.require_vapid_public_key(),
            Err(ConfigError::Missing { .. })
        ));
    }

    #[test]
    fn test_require_vapid_key_present() {
        let config = AppConfig { vapid_public_key: Some("BCCs2e".into()), ..Default::default() };
        assert_eq!(config.require_vapid_public_key().unwrap(), "BCCs2e");
    }
}

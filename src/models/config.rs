//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Catalog endpoint settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Synchronization behavior settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Notification settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Storage layout settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Dashboard server settings
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        if !path.as_ref().exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.http.max_connections_per_host == 0 {
            return Err(AppError::validation(
                "http.max_connections_per_host must be > 0",
            ));
        }
        Url::parse(&self.catalog.search_endpoint)
            .map_err(|e| AppError::validation(format!("catalog.search_endpoint: {e}")))?;
        Url::parse(&self.catalog.dataset_base_url)
            .map_err(|e| AppError::validation(format!("catalog.dataset_base_url: {e}")))?;
        if self.catalog.rows == 0 {
            return Err(AppError::validation("catalog.rows must be > 0"));
        }
        if self.sync.max_resource_size <= 0 {
            return Err(AppError::validation("sync.max_resource_size must be > 0"));
        }
        if self.sync.max_fetch_attempts == 0 {
            return Err(AppError::validation("sync.max_fetch_attempts must be > 0"));
        }
        if self.notify.chat_id.trim().is_empty() {
            return Err(AppError::validation("notify.chat_id is empty"));
        }
        if self.notify.message_budget == 0 {
            return Err(AppError::validation("notify.message_budget must be > 0"));
        }
        Ok(())
    }
}

/// HTTP client settings shared by all outbound requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header identifying this client to the catalog
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Cap on concurrent downloads during the bootstrap pass
    #[serde(default = "defaults::max_connections")]
    pub max_connections_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_connections_per_host: defaults::max_connections(),
        }
    }
}

/// Catalog endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Package search endpoint (POST)
    #[serde(default = "defaults::search_endpoint")]
    pub search_endpoint: String,

    /// Upper row-count bound sent with the search query
    #[serde(default = "defaults::rows")]
    pub rows: u64,

    /// Base URL for canonical dataset pages (used in link entities)
    #[serde(default = "defaults::dataset_base_url")]
    pub dataset_base_url: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            search_endpoint: defaults::search_endpoint(),
            rows: defaults::rows(),
            dataset_base_url: defaults::dataset_base_url(),
        }
    }
}

/// Synchronization behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Resources with a declared size at or above this are never fetched
    #[serde(default = "defaults::max_resource_size")]
    pub max_resource_size: i64,

    /// Resource ids excluded from tracking
    #[serde(default = "defaults::exempt_resources")]
    pub exempt_resources: Vec<String>,

    /// Bootstrap fetches resources modified within this many days
    #[serde(default = "defaults::bootstrap_window_days")]
    pub bootstrap_window_days: i64,

    /// Pause between resources in the update pass, in seconds
    #[serde(default = "defaults::notify_delay")]
    pub notify_delay_secs: u64,

    /// Initial retry backoff in seconds (doubles per attempt)
    #[serde(default = "defaults::backoff_initial")]
    pub backoff_initial_secs: u64,

    /// Maximum download attempts per resource during bootstrap
    #[serde(default = "defaults::max_fetch_attempts")]
    pub max_fetch_attempts: u32,

    /// Skip the notification when a timestamp-newer resource has no
    /// changed lines. Off by default: an empty update still signals that
    /// the resource was republished.
    #[serde(default)]
    pub suppress_empty_diffs: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_resource_size: defaults::max_resource_size(),
            exempt_resources: defaults::exempt_resources(),
            bootstrap_window_days: defaults::bootstrap_window_days(),
            notify_delay_secs: defaults::notify_delay(),
            backoff_initial_secs: defaults::backoff_initial(),
            max_fetch_attempts: defaults::max_fetch_attempts(),
            suppress_empty_diffs: false,
        }
    }
}

/// Notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Chat target for notifications
    #[serde(default = "defaults::chat_id")]
    pub chat_id: String,

    /// UTF-16 length ceiling for a line-diff message body
    #[serde(default = "defaults::message_budget")]
    pub message_budget: usize,

    /// Resource id of the flight board, which gets the aggregate
    /// formatter instead of a line diff
    #[serde(default = "defaults::flight_resource")]
    pub flight_resource: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            chat_id: defaults::chat_id(),
            message_budget: defaults::message_budget(),
            flight_resource: defaults::flight_resource(),
        }
    }
}

/// Storage layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Baseline snapshot filename inside the storage directory
    #[serde(default = "defaults::snapshot_file")]
    pub snapshot_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_file: defaults::snapshot_file(),
        }
    }
}

/// Dashboard server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Bind address for the dashboard HTTP server
    #[serde(default = "defaults::dashboard_bind")]
    pub bind: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind: defaults::dashboard_bind(),
        }
    }
}

mod defaults {
    pub fn user_agent() -> String {
        "github.com/wissotsky#datagov-external-client".into()
    }
    pub fn timeout() -> u64 {
        120
    }
    pub fn max_connections() -> usize {
        50
    }

    pub fn search_endpoint() -> String {
        "https://data.gov.il/api/3/action/package_search".into()
    }
    pub fn rows() -> u64 {
        99_999
    }
    pub fn dataset_base_url() -> String {
        "https://data.gov.il/dataset".into()
    }

    pub fn max_resource_size() -> i64 {
        200_000_000
    }
    pub fn exempt_resources() -> Vec<String> {
        vec![
            "053cea08-09bc-40ec-8f7a-156f0677aff3".into(),
            "aba233c2-6a5a-487d-b0a8-9413ef849f15".into(),
        ]
    }
    pub fn bootstrap_window_days() -> i64 {
        7
    }
    pub fn notify_delay() -> u64 {
        2
    }
    pub fn backoff_initial() -> u64 {
        5
    }
    pub fn max_fetch_attempts() -> u32 {
        5
    }

    pub fn chat_id() -> String {
        "@datasoup".into()
    }
    pub fn message_budget() -> usize {
        3800
    }
    pub fn flight_resource() -> String {
        "e83f763b-b7d7-479e-b172-ae981ddc6de5".into()
    }

    pub fn snapshot_file() -> String {
        "packagedata.json".into()
    }

    pub fn dashboard_bind() -> String {
        "0.0.0.0:8080".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_endpoint() {
        let mut config = Config::default();
        config.catalog.search_endpoint = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_attempts() {
        let mut config = Config::default();
        config.sync.max_fetch_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [notify]
            chat_id = "@elsewhere"
            "#,
        )
        .unwrap();
        assert_eq!(config.notify.chat_id, "@elsewhere");
        assert_eq!(config.notify.message_budget, 3800);
        assert_eq!(config.sync.exempt_resources.len(), 2);
    }
}

//! Configuration management
//!
//! This module handles loading and parsing configuration for the StudyVault client core.
//! Configuration can be loaded from:
//! - studyvault.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Persisted session storage
    #[serde(default)]
    pub storage: StorageConfig,
    /// Notification and liveness polling
    #[serde(default)]
    pub poller: PollerConfig,
    /// Navigation targets used by forced logouts
    #[serde(default)]
    pub navigation: NavigationConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is joined to
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_api_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    "http://localhost:5001/api".to_string()
}

fn default_api_timeout() -> u64 {
    30
}

/// Persisted session storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage driver (file or memory)
    #[serde(default)]
    pub driver: StorageDriver,
    /// Path of the session file
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            driver: StorageDriver::default(),
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("data/session.json")
}

/// Storage driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    /// JSON file on disk (default)
    #[default]
    File,
    /// Process memory only, nothing survives a restart
    Memory,
}

/// Poller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Interval between liveness checks in seconds
    #[serde(default = "default_liveness_interval")]
    pub liveness_interval_secs: u64,
    /// Upper bound for a single poll request in seconds
    #[serde(default = "default_poll_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            liveness_interval_secs: default_liveness_interval(),
            request_timeout_secs: default_poll_timeout(),
        }
    }
}

impl PollerConfig {
    pub fn liveness_interval(&self) -> Duration {
        Duration::from_secs(self.liveness_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_liveness_interval() -> u64 {
    120
}

fn default_poll_timeout() -> u64 {
    15
}

/// Navigation targets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Where a plain logout lands
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Where a suspended account lands
    #[serde(default = "default_suspended_path")]
    pub suspended_path: String,
    /// Avatar used when the server has none
    #[serde(default = "default_avatar")]
    pub default_avatar: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            suspended_path: default_suspended_path(),
            default_avatar: default_avatar(),
        }
    }
}

fn default_login_path() -> String {
    "/sign-up".to_string()
}

fn default_suspended_path() -> String {
    "/suspended".to_string()
}

fn default_avatar() -> String {
    crate::models::DEFAULT_AVATAR.to_string()
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - STUDYVAULT_API_BASE_URL
    /// - STUDYVAULT_API_TIMEOUT_SECS
    /// - STUDYVAULT_STORAGE_DRIVER
    /// - STUDYVAULT_STORAGE_PATH
    /// - STUDYVAULT_POLLER_LIVENESS_INTERVAL_SECS
    /// - STUDYVAULT_POLLER_REQUEST_TIMEOUT_SECS
    /// - STUDYVAULT_NAVIGATION_LOGIN_PATH
    /// - STUDYVAULT_NAVIGATION_SUSPENDED_PATH
    ///
    /// The merged result is validated before it is returned.
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values the client cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "api.base_url cannot be empty".to_string(),
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "api.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.poller.liveness_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "poller.liveness_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.poller.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "poller.request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        // API configuration
        if let Ok(base_url) = std::env::var("STUDYVAULT_API_BASE_URL") {
            self.api.base_url = base_url;
        }
        if let Ok(timeout) = std::env::var("STUDYVAULT_API_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.api.timeout_secs = timeout;
            }
        }

        // Storage configuration
        if let Ok(driver) = std::env::var("STUDYVAULT_STORAGE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "file" => self.storage.driver = StorageDriver::File,
                "memory" => self.storage.driver = StorageDriver::Memory,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(path) = std::env::var("STUDYVAULT_STORAGE_PATH") {
            self.storage.path = PathBuf::from(path);
        }

        // Poller configuration
        if let Ok(interval) = std::env::var("STUDYVAULT_POLLER_LIVENESS_INTERVAL_SECS") {
            if let Ok(interval) = interval.parse::<u64>() {
                self.poller.liveness_interval_secs = interval;
            }
        }
        if let Ok(timeout) = std::env::var("STUDYVAULT_POLLER_REQUEST_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.poller.request_timeout_secs = timeout;
            }
        }

        // Navigation configuration
        if let Ok(login_path) = std::env::var("STUDYVAULT_NAVIGATION_LOGIN_PATH") {
            self.navigation.login_path = login_path;
        }
        if let Ok(suspended_path) = std::env::var("STUDYVAULT_NAVIGATION_SUSPENDED_PATH") {
            self.navigation.suspended_path = suspended_path;
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared by `tests` and `property_tests`; both mutate process environment.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "STUDYVAULT_API_BASE_URL",
    "STUDYVAULT_API_TIMEOUT_SECS",
    "STUDYVAULT_STORAGE_DRIVER",
    "STUDYVAULT_STORAGE_PATH",
    "STUDYVAULT_POLLER_LIVENESS_INTERVAL_SECS",
    "STUDYVAULT_POLLER_REQUEST_TIMEOUT_SECS",
    "STUDYVAULT_NAVIGATION_LOGIN_PATH",
    "STUDYVAULT_NAVIGATION_SUSPENDED_PATH",
];

#[cfg(test)]
fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        super::CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::path::Path::new("nonexistent_studyvault.yml");
        let config = Config::load(path).unwrap();

        assert_eq!(config.api.base_url, "http://localhost:5001/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.storage.driver, StorageDriver::File);
        assert_eq!(config.storage.path, PathBuf::from("data/session.json"));
        assert_eq!(config.poller.liveness_interval_secs, 120);
        assert_eq!(config.poller.request_timeout_secs, 15);
        assert_eq!(config.navigation.login_path, "/sign-up");
        assert_eq!(config.navigation.suspended_path, "/suspended");
        assert_eq!(config.navigation.default_avatar, "/images/avatar.png");
    }

    #[test]
    fn test_load_empty_file_returns_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.api.base_url, "http://localhost:5001/api");
        assert_eq!(config.poller.liveness_interval(), Duration::from_secs(120));
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "poller:\n  liveness_interval_secs: 30\n").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.poller.liveness_interval_secs, 30);
        assert_eq!(config.poller.request_timeout_secs, 15);
        assert_eq!(config.storage.driver, StorageDriver::File);
    }

    #[test]
    fn test_load_full_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"
api:
  base_url: "https://studyvault.example/api"
  timeout_secs: 10
storage:
  driver: memory
  path: "/tmp/sv.json"
poller:
  liveness_interval_secs: 60
  request_timeout_secs: 5
navigation:
  login_path: "/login"
  suspended_path: "/banned"
  default_avatar: "/img/none.png"
"#).unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.api.base_url, "https://studyvault.example/api");
        assert_eq!(config.api.timeout(), Duration::from_secs(10));
        assert_eq!(config.storage.driver, StorageDriver::Memory);
        assert_eq!(config.storage.path, PathBuf::from("/tmp/sv.json"));
        assert_eq!(config.poller.liveness_interval_secs, 60);
        assert_eq!(config.poller.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.navigation.login_path, "/login");
        assert_eq!(config.navigation.suspended_path, "/banned");
        assert_eq!(config.navigation.default_avatar, "/img/none.png");
    }

    #[test]
    fn test_load_invalid_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "api:\n  timeout_secs: not_a_number\n").unwrap();

        let result = Config::load(file.path());

        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("parse"));
    }

    #[test]
    fn test_load_malformed_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "api:\n  base_url: [invalid yaml").unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.poller.liveness_interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        let mut config = Config::default();
        config.api.base_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_override_api_and_storage() {
        let _guard = lock_env();
        clear_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "api:\n  timeout_secs: 30\n").unwrap();

        std::env::set_var("STUDYVAULT_API_BASE_URL", "http://10.0.0.2:5001/api");
        std::env::set_var("STUDYVAULT_API_TIMEOUT_SECS", "12");
        std::env::set_var("STUDYVAULT_STORAGE_DRIVER", "memory");
        std::env::set_var("STUDYVAULT_STORAGE_PATH", "/var/lib/studyvault/session.json");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.api.base_url, "http://10.0.0.2:5001/api");
        assert_eq!(config.api.timeout_secs, 12);
        assert_eq!(config.storage.driver, StorageDriver::Memory);
        assert_eq!(
            config.storage.path,
            PathBuf::from("/var/lib/studyvault/session.json")
        );

        clear_env();
    }

    #[test]
    fn test_env_override_poller_and_navigation() {
        let _guard = lock_env();
        clear_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "").unwrap();

        std::env::set_var("STUDYVAULT_POLLER_LIVENESS_INTERVAL_SECS", "45");
        std::env::set_var("STUDYVAULT_POLLER_REQUEST_TIMEOUT_SECS", "3");
        std::env::set_var("STUDYVAULT_NAVIGATION_LOGIN_PATH", "/welcome");
        std::env::set_var("STUDYVAULT_NAVIGATION_SUSPENDED_PATH", "/locked");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.poller.liveness_interval_secs, 45);
        assert_eq!(config.poller.request_timeout_secs, 3);
        assert_eq!(config.navigation.login_path, "/welcome");
        assert_eq!(config.navigation.suspended_path, "/locked");

        clear_env();
    }

    #[test]
    fn test_env_override_invalid_values_ignored() {
        let _guard = lock_env();
        clear_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "storage:\n  driver: file\n").unwrap();

        std::env::set_var("STUDYVAULT_API_TIMEOUT_SECS", "soon");
        std::env::set_var("STUDYVAULT_STORAGE_DRIVER", "floppy");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.storage.driver, StorageDriver::File);

        clear_env();
    }

    #[test]
    fn test_env_override_zero_interval_fails_validation() {
        let _guard = lock_env();
        clear_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "").unwrap();

        std::env::set_var("STUDYVAULT_POLLER_LIVENESS_INTERVAL_SECS", "0");
        let result = Config::load_with_env(file.path());
        clear_env();

        assert!(result.is_err());
    }
}

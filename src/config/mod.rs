//! Configuration management for storeops

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Default API host used when neither the config file nor `--api-host` set one
pub const DEFAULT_API_HOST: &str = "http://localhost:8080";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend host, e.g. `https://shop.example.com`
    #[serde(default = "default_api_host")]
    pub api_host: String,

    /// Path prefix of the admin namespace
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Refresh endpoint, relative to the API prefix
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,

    /// Login endpoint, relative to the API prefix
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Logout endpoint, relative to the API prefix
    #[serde(default = "default_logout_path")]
    pub logout_path: String,

    /// Where the user is sent once the session cannot be recovered
    #[serde(default = "default_login_route")]
    pub login_route: String,

    /// Email used by `storeops login` when none is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Timeouts and delays
    #[serde(default)]
    pub timeouts: Timeouts,
}

/// Timeouts for the HTTP layer and the refresh cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeouts {
    /// Upper bound for ordinary requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_secs: u64,

    /// Upper bound for the refresh call
    #[serde(default = "default_refresh_timeout_secs")]
    pub refresh_secs: u64,

    /// How long a queued request waits for an in-flight refresh
    #[serde(default = "default_queue_timeout_secs")]
    pub queue_secs: u64,

    /// Pause between the session-expired notice and the redirect
    #[serde(default = "default_logout_delay_ms")]
    pub logout_delay_ms: u64,
}

fn default_api_host() -> String {
    DEFAULT_API_HOST.to_string()
}

fn default_api_prefix() -> String {
    "/api/v1/admin".to_string()
}

fn default_refresh_path() -> String {
    "/auth/refresh-token".to_string()
}

fn default_login_path() -> String {
    "/auth/login".to_string()
}

fn default_logout_path() -> String {
    "/auth/logout".to_string()
}

fn default_login_route() -> String {
    "/login".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_refresh_timeout_secs() -> u64 {
    10
}

fn default_queue_timeout_secs() -> u64 {
    30
}

fn default_logout_delay_ms() -> u64 {
    1500
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request_secs: default_request_timeout_secs(),
            refresh_secs: default_refresh_timeout_secs(),
            queue_secs: default_queue_timeout_secs(),
            logout_delay_ms: default_logout_delay_ms(),
        }
    }
}

impl Timeouts {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    pub fn refresh(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    pub fn queue(&self) -> Duration {
        Duration::from_secs(self.queue_secs)
    }

    pub fn logout_delay(&self) -> Duration {
        Duration::from_millis(self.logout_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_host: default_api_host(),
            api_prefix: default_api_prefix(),
            refresh_path: default_refresh_path(),
            login_path: default_login_path(),
            logout_path: default_logout_path(),
            login_route: default_login_route(),
            email: None,
            timeouts: Timeouts::default(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".storeops").join("config.yaml"))
    }

    /// Resolve an explicit path or fall back to the default location
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load configuration from a specific path, returning defaults when the
    /// file does not exist
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;
        std::fs::write(&path, contents)?;

        Ok(())
    }

    /// Reject values the client cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.api_host.starts_with("http://") && !self.api_host.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "api_host must start with http:// or https:// (got '{}')",
                self.api_host
            ))
            .into());
        }
        if self.timeouts.refresh_secs == 0 {
            return Err(
                ConfigError::Invalid("timeouts.refresh_secs must be positive".to_string()).into(),
            );
        }
        Ok(())
    }

    /// Base URL for admin API calls: host plus prefix, without trailing slash
    pub fn base_url(&self) -> String {
        format!(
            "{}{}",
            self.api_host.trim_end_matches('/'),
            self.api_prefix.trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_host, DEFAULT_API_HOST);
        assert_eq!(config.timeouts.refresh(), Duration::from_secs(10));
        assert_eq!(config.timeouts.logout_delay(), Duration::from_millis(1500));
        assert!(config.email.is_none());
    }

    #[test]
    fn test_base_url_joins_host_and_prefix() {
        let config = Config {
            api_host: "https://shop.example.com/".to_string(),
            ..Config::default()
        };
        assert_eq!(config.base_url(), "https://shop.example.com/api/v1/admin");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = tempdir().unwrap();
        let config = Config::load_from(temp.path().join("nope.yaml")).unwrap();
        assert_eq!(config.login_route, "/login");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            "api_host: https://admin.example.com\ntimeouts:\n  queue_secs: 5\n",
        )
        .unwrap();

        let config = Config::load_from(path).unwrap();
        assert_eq!(config.api_host, "https://admin.example.com");
        assert_eq!(config.timeouts.queue(), Duration::from_secs(5));
        assert_eq!(config.timeouts.refresh_secs, 10);
    }

    #[test]
    fn test_save_and_reload() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join("config.yaml");
        let config = Config {
            email: Some("ops@example.com".to_string()),
            ..Config::default()
        };
        config.save_to(path.clone()).unwrap();

        let loaded = Config::load_from(path).unwrap();
        assert_eq!(loaded.email.as_deref(), Some("ops@example.com"));
    }

    #[test]
    fn test_invalid_host_rejected() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "api_host: shop.example.com\n").unwrap();

        assert!(Config::load_from(path).is_err());
    }
}

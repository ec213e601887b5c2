//! Dashboard configuration using Figment
//!
//! Configuration is loaded from:
//! 1. a TOML file (`config/dashboard.toml` by default)
//! 2. environment variables prefixed with `ODIN_DASHBOARD_`, nested keys separated
//!    by a double underscore (`ODIN_DASHBOARD_POLLING__DELAY_MS=500`)
//!
//! Every field except `adapters` has a default, so a minimal file only lists the
//! adapters to show.
//!
//! # Example
//! ```no_run
//! use odin_dashboard::config::DashboardConfig;
//!
//! let config = DashboardConfig::load()?;
//! config.validate()?;
//! println!("Polling {} every {:?}", config.adapters.join(", "), config.poll_delay());
//! # Ok::<(), odin_dashboard::error::DashboardError>(())
//! ```

use std::path::Path;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DashboardError, DashboardResult};

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/dashboard.toml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "ODIN_DASHBOARD_";

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level dashboard configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Adapters to build pages for, in display order
    #[serde(default)]
    pub adapters: Vec<String>,
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Backend server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Poll loop settings
    #[serde(default)]
    pub polling: PollingConfig,
    /// Error banner settings
    #[serde(default)]
    pub banner: BannerConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// odin-control server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server root, e.g. `http://127.0.0.1:8888`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// REST API version segment
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

/// Poll loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Delay between the end of one fetch and the start of the next, in milliseconds
    #[serde(default = "default_delay")]
    pub delay_ms: u64,
}

/// Error banner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BannerConfig {
    /// How long an error stays visible, in milliseconds
    #[serde(default = "default_banner_timeout")]
    pub timeout_ms: u64,
}

// Default value functions
fn default_name() -> String {
    "Odin Dashboard".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "http://127.0.0.1:8888".to_string()
}

fn default_api_version() -> String {
    "0.1".to_string()
}

fn default_request_timeout() -> u64 {
    2000
}

fn default_delay() -> u64 {
    200
}

fn default_banner_timeout() -> u64 {
    5000
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay(),
        }
    }
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_banner_timeout(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from the default file and environment variables
    pub fn load() -> DashboardResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path plus environment overrides
    ///
    /// A missing file is not an error; the defaults and environment still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> DashboardResult<Self> {
        Ok(Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> DashboardResult<()> {
        let level = self.application.log_level.to_lowercase();
        if !VALID_LEVELS.contains(&level.as_str()) {
            return Err(DashboardError::Configuration(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                VALID_LEVELS.join(", ")
            )));
        }

        self.base_url()?;

        if self.polling.delay_ms == 0 {
            return Err(DashboardError::Configuration(
                "polling.delay_ms must be greater than 0".to_string(),
            ));
        }

        if self.adapters.is_empty() {
            return Err(DashboardError::Configuration(
                "At least one adapter must be configured".to_string(),
            ));
        }

        Ok(())
    }

    /// Parsed server root
    pub fn base_url(&self) -> DashboardResult<Url> {
        Url::parse(&self.server.base_url).map_err(|e| {
            DashboardError::Configuration(format!(
                "Invalid server.base_url '{}': {}",
                self.server.base_url, e
            ))
        })
    }

    /// Poll delay as a duration
    #[must_use]
    pub fn poll_delay(&self) -> Duration {
        Duration::from_millis(self.polling.delay_ms)
    }

    /// Banner timeout as a duration
    #[must_use]
    pub fn banner_timeout(&self) -> Duration {
        Duration::from_millis(self.banner.timeout_ms)
    }

    /// Request timeout as a duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }
}

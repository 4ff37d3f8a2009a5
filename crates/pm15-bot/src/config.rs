//! Application configuration.

use crate::error::{AppError, AppResult};
use pm15_core::TrackedAsset;
use pm15_detector::ScannerConfig;
use pm15_feed::PriceBasis;
use pm15_session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "PM15_CONFIG";

/// Config file used when neither the CLI nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Events API root.
    #[serde(default = "default_gamma_url")]
    pub gamma_url: String,
    /// Tag selecting 15-minute events.
    #[serde(default = "default_tag_slug")]
    pub tag_slug: String,
    /// Per-request HTTP timeout (ms).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Page size of the event discovery query.
    #[serde(default = "default_event_limit")]
    pub event_limit: u32,
    /// Asset selected at startup.
    #[serde(default = "default_asset")]
    pub default_asset: TrackedAsset,
    /// Start scanning as soon as the session is up.
    #[serde(default = "default_auto_start")]
    pub auto_start: bool,
    /// Record fields used for yes/no prices.
    #[serde(default)]
    pub price_basis: PriceBasis,
    /// Status line cadence (seconds).
    #[serde(default = "default_status_interval_secs")]
    pub status_interval_secs: u64,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
}

fn default_gamma_url() -> String {
    "https://gamma-api.polymarket.com".to_string()
}

fn default_tag_slug() -> String {
    "15M".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_event_limit() -> u32 {
    100
}

fn default_asset() -> TrackedAsset {
    TrackedAsset::Btc
}

fn default_auto_start() -> bool {
    true
}

fn default_status_interval_secs() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gamma_url: default_gamma_url(),
            tag_slug: default_tag_slug(),
            request_timeout_ms: default_request_timeout_ms(),
            event_limit: default_event_limit(),
            default_asset: default_asset(),
            auto_start: default_auto_start(),
            price_basis: PriceBasis::default(),
            status_interval_secs: default_status_interval_secs(),
            session: SessionConfig::default(),
            scanner: ScannerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load the first config found: `cli_path`, then `PM15_CONFIG`, then
    /// `config/default.toml`. A missing default file yields the built-in
    /// defaults; a missing explicitly named file is an error.
    pub fn load(cli_path: Option<String>) -> AppResult<Self> {
        let explicit = cli_path.or_else(|| std::env::var(CONFIG_ENV_VAR).ok());

        let config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(DEFAULT_CONFIG_PATH)?
            }
            None => {
                warn!(
                    path = DEFAULT_CONFIG_PATH,
                    "Config file not found, using built-in defaults"
                );
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> AppResult<()> {
        if self.gamma_url.trim().is_empty() {
            return Err(AppError::Config("gamma_url must not be empty".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(AppError::Config(
                "request_timeout_ms must be non-zero".to_string(),
            ));
        }
        if self.status_interval_secs == 0 {
            return Err(AppError::Config(
                "status_interval_secs must be non-zero".to_string(),
            ));
        }
        self.session.validate()?;
        self.scanner.validate()?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_secs)
    }
}

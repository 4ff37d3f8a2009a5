//! Session timing and ledger configuration.

use crate::error::{SessionError, SessionResult};
use pm15_feed::DEFAULT_DELTA_TTL;
use pm15_registry::DEFAULT_RESOLVE_THROTTLE;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one trading session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Balance at session start.
    #[serde(default = "default_starting_balance")]
    pub starting_balance: f64,
    /// Maximum number of retained log entries.
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
    /// Minimum interval between slug resolutions per asset (ms).
    #[serde(default = "default_resolve_throttle_ms")]
    pub resolve_throttle_ms: u64,
    /// Market refresh cadence (ms).
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    /// Lifetime of a price-change marker (ms).
    #[serde(default = "default_delta_ttl_ms")]
    pub delta_ttl_ms: u64,
}

fn default_starting_balance() -> f64 {
    1000.0
}

fn default_log_capacity() -> usize {
    8
}

fn default_resolve_throttle_ms() -> u64 {
    DEFAULT_RESOLVE_THROTTLE.as_millis() as u64
}

fn default_refresh_interval_ms() -> u64 {
    5_000
}

fn default_delta_ttl_ms() -> u64 {
    DEFAULT_DELTA_TTL.as_millis() as u64
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            starting_balance: default_starting_balance(),
            log_capacity: default_log_capacity(),
            resolve_throttle_ms: default_resolve_throttle_ms(),
            refresh_interval_ms: default_refresh_interval_ms(),
            delta_ttl_ms: default_delta_ttl_ms(),
        }
    }
}

impl SessionConfig {
    pub fn resolve_throttle(&self) -> Duration {
        Duration::from_millis(self.resolve_throttle_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn delta_ttl(&self) -> Duration {
        Duration::from_millis(self.delta_ttl_ms)
    }

    pub fn validate(&self) -> SessionResult<()> {
        if !self.starting_balance.is_finite() {
            return Err(SessionError::InvalidConfig(
                "starting_balance must be finite".to_string(),
            ));
        }
        if self.log_capacity == 0 {
            return Err(SessionError::InvalidConfig(
                "log_capacity must be non-zero".to_string(),
            ));
        }
        if self.refresh_interval_ms == 0 {
            return Err(SessionError::InvalidConfig(
                "refresh_interval_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.starting_balance, 1000.0);
        assert_eq!(config.log_capacity, 8);
        assert_eq!(config.resolve_throttle(), Duration::from_secs(10));
        assert_eq!(config.refresh_interval(), Duration::from_secs(5));
        assert_eq!(config.delta_ttl(), Duration::from_secs(1));
        assert_eq!(config.delta_ttl(), DEFAULT_DELTA_TTL);
        assert_eq!(config.resolve_throttle(), DEFAULT_RESOLVE_THROTTLE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config: SessionConfig = toml::from_str("log_capacity = 4").unwrap();
        assert_eq!(config.log_capacity, 4);
        assert_eq!(config.refresh_interval_ms, 5_000);

        let zero: SessionConfig = toml::from_str("log_capacity = 0").unwrap();
        assert!(zero.validate().is_err());
    }
}

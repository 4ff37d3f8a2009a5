//! Scanner configuration.

use crate::error::{DetectorError, DetectorResult};
use serde::{Deserialize, Serialize};

/// Configuration for arbitrage scanning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Notional committed per simulated trade.
    #[serde(default = "default_trade_size")]
    pub trade_size: f64,
    /// A trade triggers when yes + no is strictly below this.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Tick cadence while running (ms).
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,
    /// Chance of a "still scanning" log line on a tick without edge.
    #[serde(default = "default_scan_log_probability")]
    pub scan_log_probability: f64,
    /// Demonstration spread perturbation.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

fn default_trade_size() -> f64 {
    100.0
}

fn default_threshold() -> f64 {
    0.99
}

fn default_scan_interval_ms() -> u64 {
    200
}

fn default_scan_log_probability() -> f64 {
    0.1
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            trade_size: default_trade_size(),
            threshold: default_threshold(),
            scan_interval_ms: default_scan_interval_ms(),
            scan_log_probability: default_scan_log_probability(),
            simulation: SimulationConfig::default(),
        }
    }
}

/// Synthetic tight-spread injection.
///
/// With `probability`, a tick replaces the live quote with both prices set
/// to `round2(0.50 - gap)`, gap uniform in [`min_gap`, `max_gap`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_simulation_enabled")]
    pub enabled: bool,
    #[serde(default = "default_simulation_probability")]
    pub probability: f64,
    #[serde(default = "default_min_gap")]
    pub min_gap: f64,
    #[serde(default = "default_max_gap")]
    pub max_gap: f64,
}

fn default_simulation_enabled() -> bool {
    true
}

fn default_simulation_probability() -> f64 {
    0.2
}

fn default_min_gap() -> f64 {
    0.02
}

fn default_max_gap() -> f64 {
    0.05
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: default_simulation_enabled(),
            probability: default_simulation_probability(),
            min_gap: default_min_gap(),
            max_gap: default_max_gap(),
        }
    }
}

impl ScannerConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> DetectorResult<()> {
        if !(self.trade_size.is_finite() && self.trade_size > 0.0) {
            return Err(DetectorError::ConfigError(format!(
                "trade_size ({}) must be positive",
                self.trade_size
            )));
        }

        if !(self.threshold > 0.0 && self.threshold <= 2.0) {
            return Err(DetectorError::ConfigError(format!(
                "threshold ({}) must be in (0, 2]",
                self.threshold
            )));
        }

        if self.scan_interval_ms == 0 {
            return Err(DetectorError::ConfigError(
                "scan_interval_ms must be non-zero".to_string(),
            ));
        }

        check_probability("scan_log_probability", self.scan_log_probability)?;
        check_probability("simulation.probability", self.simulation.probability)?;

        if self.simulation.min_gap < 0.0 || self.simulation.min_gap > self.simulation.max_gap {
            return Err(DetectorError::ConfigError(format!(
                "simulation gap range [{}, {}) is invalid",
                self.simulation.min_gap, self.simulation.max_gap
            )));
        }

        Ok(())
    }
}

fn check_probability(name: &str, value: f64) -> DetectorResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(DetectorError::ConfigError(format!(
            "{name} ({value}) must be in [0, 1]"
        )))
    }
}

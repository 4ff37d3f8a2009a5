//! Prometheus metrics for pm15.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. Registration only fails on
//! duplicate metric names, which is a programming error caught at first
//! use during startup.

use crate::error::{TelemetryError, TelemetryResult};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram, register_histogram_vec,
    register_int_counter, CounterVec, Encoder, Gauge, Histogram, HistogramVec, IntCounter,
    TextEncoder,
};

/// Data-provider requests. Labels: operation, result (ok/error).
pub static PROVIDER_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pm15_provider_requests_total",
        "Total data-provider requests",
        &["operation", "result"]
    )
    .unwrap()
});

/// Data-provider latency in milliseconds.
pub static PROVIDER_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "pm15_provider_latency_ms",
        "Data-provider request latency in milliseconds",
        &["operation"],
        vec![10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap()
});

/// Slug resolutions. Labels: asset, outcome (resolved/none/throttled/failed).
pub static SLUG_RESOLUTIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pm15_slug_resolutions_total",
        "Slug resolution attempts by outcome",
        &["asset", "outcome"]
    )
    .unwrap()
});

/// Market refreshes. Labels: result (ok/stale/not_found/error).
pub static REFRESHES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pm15_refreshes_total",
        "Market refreshes by result",
        &["result"]
    )
    .unwrap()
});

/// Observed price changes. Labels: side (yes/no), direction (up/down).
pub static PRICE_DELTAS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pm15_price_deltas_total",
        "Observed price changes",
        &["side", "direction"]
    )
    .unwrap()
});

/// Scanner ticks evaluated against a selected market.
pub static SCAN_TICKS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("pm15_scan_ticks_total", "Scanner ticks with a selected market")
        .unwrap()
});

/// Simulated trades.
pub static TRADES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("pm15_trades_total", "Simulated arbitrage trades").unwrap()
});

/// Simulated profit per trade.
pub static TRADE_PROFIT: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "pm15_trade_profit",
        "Simulated profit per trade",
        vec![0.5, 1.0, 2.0, 3.0, 5.0, 8.0, 12.0, 20.0]
    )
    .unwrap()
});

/// Current session balance.
pub static BALANCE: Lazy<Gauge> =
    Lazy::new(|| register_gauge!("pm15_balance", "Current session balance").unwrap());

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record a data-provider request.
    pub fn provider_request(operation: &str, result: &str, latency_ms: f64) {
        PROVIDER_REQUESTS_TOTAL
            .with_label_values(&[operation, result])
            .inc();
        PROVIDER_LATENCY_MS
            .with_label_values(&[operation])
            .observe(latency_ms);
    }

    /// Record a slug resolution outcome.
    pub fn slug_resolution(asset: &str, outcome: &str) {
        SLUG_RESOLUTIONS_TOTAL
            .with_label_values(&[asset, outcome])
            .inc();
    }

    /// Record a refresh result.
    pub fn refresh(result: &str) {
        REFRESHES_TOTAL.with_label_values(&[result]).inc();
    }

    /// Record one side of a price change.
    pub fn price_delta(side: &str, direction: &str) {
        PRICE_DELTAS_TOTAL
            .with_label_values(&[side, direction])
            .inc();
    }

    /// Record a scanner tick.
    pub fn scan_tick() {
        SCAN_TICKS_TOTAL.inc();
    }

    /// Record a simulated trade and the resulting balance.
    pub fn trade(profit: f64, balance: f64) {
        TRADES_TOTAL.inc();
        TRADE_PROFIT.observe(profit);
        BALANCE.set(balance);
    }

    /// Set the balance gauge.
    pub fn balance(balance: f64) {
        BALANCE.set(balance);
    }

    /// Render all registered metrics in the text exposition format.
    pub fn render() -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buffer)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}

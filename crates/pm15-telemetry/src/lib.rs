//! Prometheus metrics and structured logging for pm15.
//!
//! - Structured logging with tracing (pretty in development, JSON in production)
//! - Prometheus counters for provider calls, slug resolution, refreshes,
//!   price deltas and simulated trades

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;

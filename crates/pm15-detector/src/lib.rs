//! Price-sum arbitrage scanner for pm15.
//!
//! Evaluates the selected market each tick: when yes + no is below the
//! threshold, buying both sides locks in `1 - sum` per share, and the
//! scanner reports the synthetic profit for a fixed trade size.
//!
//! The quote used for evaluation comes from an injectable `QuoteStrategy`
//! so the demonstration spread perturbation can be replaced in tests.

pub mod config;
pub mod error;
pub mod opportunity;
pub mod quote;
pub mod scanner;

pub use config::{ScannerConfig, SimulationConfig};
pub use error::{DetectorError, DetectorResult};
pub use opportunity::{profit_for, ArbOpportunity};
pub use quote::{LiveQuotes, QuoteStrategy, RandomSource, SequenceRandom, SimulatedSpread, StdRandom};
pub use scanner::{ArbScanner, ScanOutcome};

//! Core domain types for the pm15 short-window market scanner.
//!
//! This crate provides the types shared by every other crate:
//! - `TrackedAsset`: the fixed set of assets with a 15-minute market
//! - `Market`: one normalized binary-outcome contract snapshot
//! - `Direction`, `PriceDelta`: transient price-change markers
//! - `Quote`: the yes/no price pair evaluated by the scanner

pub mod asset;
pub mod error;
pub mod market;
pub mod types;

pub use asset::TrackedAsset;
pub use error::{CoreError, Result};
pub use market::{truncate_chars, Market};
pub use types::{Direction, PriceDelta, Quote};

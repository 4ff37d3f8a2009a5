//! Market normalization and refresh diffing for pm15.
//!
//! Turns raw event records into immutable `Market` snapshots, compares each
//! refresh against the previous snapshot, and keeps the transient
//! per-market `PriceDelta` markers.

pub mod delta_board;
pub mod error;
pub mod normalizer;
pub mod refresher;

pub use delta_board::{DeltaBoard, DEFAULT_DELTA_TTL};
pub use error::{FeedError, FeedResult};
pub use normalizer::{normalize, normalize_event, PriceBasis, DEFAULT_PRICE};
pub use refresher::{diff_markets, FetchedEvent, RefreshResult, Refresher};

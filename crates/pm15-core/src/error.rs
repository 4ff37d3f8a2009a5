//! Error types for pm15-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Unknown asset symbol: {0}")]
    UnknownAsset(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

//! Feed error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Provider error: {0}")]
    Provider(#[from] pm15_registry::RegistryError),

    #[error("Malformed price in field {field}: {value}")]
    MalformedPrice { field: &'static str, value: String },

    #[error("Event not found: {0}")]
    EventNotFound(String),
}

pub type FeedResult<T> = Result<T, FeedError>;

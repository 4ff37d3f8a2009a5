//! Registry error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Response decode error: {0}")]
    Decode(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

//! Session error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session channel closed")]
    ChannelClosed,

    #[error("Invalid session config: {0}")]
    InvalidConfig(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

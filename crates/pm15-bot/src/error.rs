//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Registry error: {0}")]
    Registry(#[from] pm15_registry::RegistryError),

    #[error("Detector error: {0}")]
    Detector(#[from] pm15_detector::DetectorError),

    #[error("Session error: {0}")]
    Session(#[from] pm15_session::SessionError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] pm15_telemetry::TelemetryError),
}

pub type AppResult<T> = Result<T, AppError>;

//! pm15 short-window market scanner.
//!
//! Wires the events API client, the session actor and the arbitrage
//! scanner together, and reports session status while running.

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};

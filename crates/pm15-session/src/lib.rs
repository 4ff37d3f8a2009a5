//! Session state and actor for pm15.
//!
//! - `SessionLedger`: balance, trade history and the rolling session log
//! - `SessionCore`: the session state machine, free of I/O and timers
//! - `SessionTask` / `SessionHandle`: the actor that drives the core with
//!   fetches and cadences, and the handle used by the binary

pub mod actor;
pub mod config;
pub mod error;
pub mod ledger;
pub mod state;

pub use actor::{
    spawn_session, SessionDeps, SessionHandle, SessionMsg, SessionTask, DEFAULT_CHANNEL_CAPACITY,
};
pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use ledger::{LogEntry, SessionLedger};
pub use state::{Effect, SessionCore, SessionSnapshot};

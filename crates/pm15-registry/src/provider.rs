//! Data-provider capability.

use crate::error::RegistryResult;
use crate::records::EventRecord;
use async_trait::async_trait;

/// Source of upstream event records.
///
/// Implementations perform network I/O; callers treat every error as
/// "no state change, log and continue".
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait EventProvider: Send + Sync {
    /// Active, not-closed events tagged as 15-minute markets.
    async fn list_short_window_events(&self) -> RegistryResult<Vec<EventRecord>>;

    /// Event(s) matching one slug. Usually a single element.
    async fn get_event_by_slug(&self, slug: &str) -> RegistryResult<Vec<EventRecord>>;
}

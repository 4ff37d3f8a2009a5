//! Event data provider and slug resolution for pm15.
//!
//! - `EventProvider`: the data-provider capability consumed by the core
//! - `GammaClient`: HTTP implementation against the Gamma events API
//! - `SlugResolver`: maps each tracked asset to its current event slug,
//!   under a per-asset minimum-interval throttle

pub mod client;
pub mod error;
pub mod provider;
pub mod records;
pub mod slug_resolver;

pub use client::GammaClient;
pub use error::{RegistryError, RegistryResult};
#[cfg(any(test, feature = "mock"))]
pub use provider::MockEventProvider;
pub use provider::EventProvider;
pub use records::{EventRecord, MarketRecord, OneOrMany};
pub use slug_resolver::{
    build_slug_map, fetch_slug_map, ResolveDecision, SlugResolver,
    DEFAULT_RESOLVE_THROTTLE,
};

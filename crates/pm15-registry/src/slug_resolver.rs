//! Slug resolution for tracked assets.
//!
//! Each tracked asset maps to the slug of its currently active 15-minute
//! event. Resolution is split into a synchronous decision (`begin`), the
//! network fetch (`fetch_slug_map`), and a synchronous apply (`complete`),
//! so a single-threaded owner can keep handling other work while the
//! fetch is in flight.
//!
//! Throttle: an attempt for an asset is skipped (no network, no state
//! change) if fewer than `throttle` has elapsed since that asset's last
//! attempt. The initial load is exempt from the throttle but guarded by a
//! latch so it runs at most once; a failed initial load re-arms the latch.

use crate::error::RegistryResult;
use crate::provider::EventProvider;
use crate::records::EventRecord;
use pm15_core::TrackedAsset;
use pm15_telemetry::Metrics;
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Minimum interval between resolution attempts for one asset.
pub const DEFAULT_RESOLVE_THROTTLE: Duration = Duration::from_secs(10);

/// Build symbol -> slug from a batch of events.
///
/// First match wins; later events for the same asset are ignored. Events
/// whose slug does not start with a tracked symbol are skipped.
pub fn build_slug_map(events: &[EventRecord]) -> HashMap<TrackedAsset, String> {
    let mut slugs = HashMap::new();
    for event in events {
        if let Some(asset) = TrackedAsset::from_slug(&event.slug) {
            slugs.entry(asset).or_insert_with(|| event.slug.clone());
        }
    }
    slugs
}

/// Fetch short-window events and build the slug map.
pub async fn fetch_slug_map(
    provider: &dyn EventProvider,
) -> RegistryResult<HashMap<TrackedAsset, String>> {
    let events = provider.list_short_window_events().await?;
    let slugs = build_slug_map(&events);
    debug!(events = events.len(), matched = slugs.len(), "Built slug map");
    Ok(slugs)
}

/// Outcome of the synchronous throttle check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveDecision {
    /// Attempt recorded; the caller should fetch.
    Fetch,
    /// Too soon since the last attempt.
    Throttled {
        remaining: Duration,
        cached: Option<String>,
    },
}

#[derive(Debug, Clone, Default)]
struct ResolutionEntry {
    resolved_slug: Option<String>,
    last_attempt: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InitialLoad {
    Pending,
    InFlight,
    Loaded,
}

/// Per-asset slug cache with throttle and initial-load latch.
#[derive(Debug)]
pub struct SlugResolver {
    throttle: Duration,
    entries: HashMap<TrackedAsset, ResolutionEntry>,
    initial: InitialLoad,
}

impl SlugResolver {
    pub fn new(throttle: Duration) -> Self {
        Self {
            throttle,
            entries: HashMap::new(),
            initial: InitialLoad::Pending,
        }
    }

    /// Currently resolved slug for an asset.
    pub fn resolved_slug(&self, asset: TrackedAsset) -> Option<&str> {
        self.entries
            .get(&asset)
            .and_then(|entry| entry.resolved_slug.as_deref())
    }

    /// All resolved slugs, ordered by asset.
    pub fn resolved_slugs(&self) -> BTreeMap<TrackedAsset, String> {
        self.entries
            .iter()
            .filter_map(|(asset, entry)| entry.resolved_slug.clone().map(|slug| (*asset, slug)))
            .collect()
    }

    /// Whether the initial load has completed successfully.
    pub fn is_loaded(&self) -> bool {
        self.initial == InitialLoad::Loaded
    }

    /// Check the throttle for `asset` and record the attempt if allowed.
    pub fn begin(&mut self, asset: TrackedAsset, now: Instant) -> ResolveDecision {
        let entry = self.entries.entry(asset).or_default();

        if let Some(last) = entry.last_attempt {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.throttle {
                let remaining = self.throttle - elapsed;
                Metrics::slug_resolution(asset.symbol(), "throttled");
                debug!(%asset, remaining_ms = remaining.as_millis() as u64, "Resolution throttled");
                return ResolveDecision::Throttled {
                    remaining,
                    cached: entry.resolved_slug.clone(),
                };
            }
        }

        entry.last_attempt = Some(now);
        ResolveDecision::Fetch
    }

    /// Apply a fetched slug map to `asset`.
    ///
    /// Returns the new slug, or `None` when the asset has no active event
    /// (the cached slug is cleared so stale data is not retained).
    pub fn complete(
        &mut self,
        asset: TrackedAsset,
        slugs: &HashMap<TrackedAsset, String>,
    ) -> Option<String> {
        let slug = slugs.get(&asset).cloned();
        let entry = self.entries.entry(asset).or_default();

        if entry.resolved_slug != slug {
            info!(%asset, old = ?entry.resolved_slug, new = ?slug, "Resolved slug changed");
        }
        entry.resolved_slug = slug.clone();

        Metrics::slug_resolution(
            asset.symbol(),
            if slug.is_some() { "resolved" } else { "none" },
        );
        slug
    }

    /// Arm the initial load. Returns `false` if it already ran or is running.
    pub fn begin_initial(&mut self) -> bool {
        if self.initial != InitialLoad::Pending {
            return false;
        }
        self.initial = InitialLoad::InFlight;
        true
    }

    /// Apply the initial slug map to every tracked asset.
    pub fn complete_initial(&mut self, slugs: &HashMap<TrackedAsset, String>, now: Instant) {
        for asset in TrackedAsset::ALL {
            let entry = self.entries.entry(asset).or_default();
            entry.resolved_slug = slugs.get(&asset).cloned();
            entry.last_attempt = Some(now);
        }
        self.initial = InitialLoad::Loaded;
        info!(resolved = slugs.len(), "Initial slug load complete");
    }

    /// Re-arm the latch after a failed initial load.
    pub fn fail_initial(&mut self) {
        self.initial = InitialLoad::Pending;
    }
}

impl Default for SlugResolver {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLVE_THROTTLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use crate::provider::MockEventProvider;

    fn event(slug: &str) -> EventRecord {
        EventRecord {
            slug: slug.to_string(),
            ..Default::default()
        }
    }

    fn sample_events() -> Vec<EventRecord> {
        vec![
            event("btc-updown-15m-1760000000"),
            event("eth-updown-15m-1760000000"),
            event("BTC-updown-15m-1760000900"),
            event("doge-updown-15m-1760000000"),
        ]
    }

    #[test]
    fn test_build_slug_map_first_match_wins() {
        let slugs = build_slug_map(&sample_events());

        assert_eq!(slugs.len(), 2);
        assert_eq!(slugs[&TrackedAsset::Btc], "btc-updown-15m-1760000000");
        assert_eq!(slugs[&TrackedAsset::Eth], "eth-updown-15m-1760000000");
        assert!(!slugs.contains_key(&TrackedAsset::Sol));
    }

    #[test]
    fn test_throttle_window() {
        let mut resolver = SlugResolver::default();
        let t0 = Instant::now();

        assert_eq!(resolver.begin(TrackedAsset::Btc, t0), ResolveDecision::Fetch);

        match resolver.begin(TrackedAsset::Btc, t0 + Duration::from_secs(3)) {
            ResolveDecision::Throttled { remaining, cached } => {
                assert_eq!(remaining, Duration::from_secs(7));
                assert!(cached.is_none());
            }
            other => panic!("expected throttle, got {other:?}"),
        }

        // Throttle is per asset
        assert_eq!(
            resolver.begin(TrackedAsset::Eth, t0 + Duration::from_secs(3)),
            ResolveDecision::Fetch
        );

        // Exactly at the interval is allowed
        assert_eq!(
            resolver.begin(TrackedAsset::Btc, t0 + Duration::from_secs(10)),
            ResolveDecision::Fetch
        );
    }

    #[test]
    fn test_complete_clears_missing_asset() {
        let mut resolver = SlugResolver::default();
        let slugs = build_slug_map(&sample_events());

        assert_eq!(
            resolver.complete(TrackedAsset::Btc, &slugs).as_deref(),
            Some("btc-updown-15m-1760000000")
        );
        assert_eq!(resolver.complete(TrackedAsset::Btc, &HashMap::new()), None);
        assert!(resolver.resolved_slug(TrackedAsset::Btc).is_none());
    }

    #[test]
    fn test_initial_latch() {
        let mut resolver = SlugResolver::default();
        let now = Instant::now();

        assert!(resolver.begin_initial());
        assert!(!resolver.begin_initial(), "in-flight load must not re-run");

        resolver.fail_initial();
        assert!(resolver.begin_initial(), "failure re-arms the latch");

        resolver.complete_initial(&build_slug_map(&sample_events()), now);
        assert!(resolver.is_loaded());
        assert!(!resolver.begin_initial());
        assert_eq!(resolver.resolved_slugs().len(), 2);

        // Initial load counts as the last attempt
        assert!(matches!(
            resolver.begin(TrackedAsset::Btc, now + Duration::from_secs(1)),
            ResolveDecision::Throttled { cached: Some(_), .. }
        ));
    }

    #[tokio::test]
    async fn test_throttled_attempt_makes_one_request() {
        let mut provider = MockEventProvider::new();
        provider
            .expect_list_short_window_events()
            .times(1)
            .returning(|| Ok(sample_events()));

        let mut resolver = SlugResolver::default();
        let t0 = Instant::now();

        assert_eq!(resolver.begin(TrackedAsset::Btc, t0), ResolveDecision::Fetch);
        let slugs = fetch_slug_map(&provider).await.unwrap();
        assert_eq!(
            resolver.complete(TrackedAsset::Btc, &slugs).as_deref(),
            Some("btc-updown-15m-1760000000")
        );

        assert_eq!(
            resolver.begin(TrackedAsset::Btc, t0 + Duration::from_secs(9)),
            ResolveDecision::Throttled {
                remaining: Duration::from_secs(1),
                cached: Some("btc-updown-15m-1760000000".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_no_active_event_for_asset() {
        let mut provider = MockEventProvider::new();
        provider
            .expect_list_short_window_events()
            .returning(|| Ok(sample_events()));

        let mut resolver = SlugResolver::default();
        assert_eq!(
            resolver.begin(TrackedAsset::Xrp, Instant::now()),
            ResolveDecision::Fetch
        );
        let slugs = fetch_slug_map(&provider).await.unwrap();

        assert_eq!(resolver.complete(TrackedAsset::Xrp, &slugs), None);
        assert!(resolver.resolved_slugs().get(&TrackedAsset::Xrp).is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_prior_slug() {
        let mut provider = MockEventProvider::new();
        let mut calls = 0;
        provider
            .expect_list_short_window_events()
            .times(2)
            .returning(move || {
                calls += 1;
                if calls == 1 {
                    Ok(sample_events())
                } else {
                    Err(RegistryError::HttpClient("connection reset".to_string()))
                }
            });

        let mut resolver = SlugResolver::default();
        let t0 = Instant::now();
        resolver.begin(TrackedAsset::Eth, t0);
        let slugs = fetch_slug_map(&provider).await.unwrap();
        resolver.complete(TrackedAsset::Eth, &slugs);

        assert_eq!(
            resolver.begin(TrackedAsset::Eth, t0 + Duration::from_secs(11)),
            ResolveDecision::Fetch
        );
        assert!(fetch_slug_map(&provider).await.is_err());
        assert_eq!(
            resolver.resolved_slug(TrackedAsset::Eth),
            Some("eth-updown-15m-1760000000")
        );
    }
}

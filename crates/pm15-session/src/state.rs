//! Session state machine.
//!
//! `SessionCore` owns all mutable session state and never performs I/O or
//! waits on timers. Every transition is synchronous and returns the
//! `Effect`s the owner must carry out (fetches, cadence changes, expiry
//! timers). Responses come back through the `on_*` methods.
//!
//! Refresh responses carry the token of the request that produced them.
//! A response is applied only if its token is newer than the last applied
//! one and its asset is still selected.

use crate::config::SessionConfig;
use crate::ledger::SessionLedger;
use chrono::{DateTime, Utc};
use pm15_core::{Market, PriceDelta, TrackedAsset};
use pm15_detector::{ArbScanner, ScanOutcome};
use pm15_feed::{diff_markets, DeltaBoard, FeedError, FeedResult, FetchedEvent};
use pm15_registry::{RegistryResult, ResolveDecision, SlugResolver};
use pm15_telemetry::Metrics;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Work requested by a state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Load slugs for every tracked asset (initial load).
    FetchInitial,
    /// Re-arm the initial load once the resolve throttle has elapsed.
    RetryInitial,
    /// Resolve the slug of one asset.
    FetchSlugMap { asset: TrackedAsset },
    /// Fetch the event behind `slug`.
    FetchEvent {
        token: u64,
        asset: TrackedAsset,
        slug: String,
    },
    /// (Re)start the periodic refresh for the selected asset. While the
    /// asset has no slug, each tick re-resolves it instead.
    RestartRefreshCadence,
    StopRefreshCadence,
    StartScan,
    StopScan,
    /// Clear the price-change marker of a market once its lifetime ends.
    ScheduleDeltaClear { market_id: String },
}

/// Read-only view of the session for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub balance: f64,
    pub starting_balance: f64,
    pub trade_history: Vec<f64>,
    pub total_profit: f64,
    pub trade_count: usize,
    pub last_profit: Option<f64>,
    pub log_lines: Vec<String>,
    pub selected_asset: TrackedAsset,
    pub selected_market: Option<Market>,
    pub markets: Vec<Market>,
    pub deltas: BTreeMap<String, PriceDelta>,
    pub is_running: bool,
    pub resolved_slugs: BTreeMap<TrackedAsset, String>,
}

impl SessionSnapshot {
    /// Delta for a market, cleared when none is active.
    pub fn delta(&self, market_id: &str) -> PriceDelta {
        self.deltas.get(market_id).copied().unwrap_or_default()
    }
}

pub struct SessionCore {
    ledger: SessionLedger,
    resolver: SlugResolver,
    selected_asset: TrackedAsset,
    selected_market_id: Option<String>,
    markets: Vec<Market>,
    deltas: DeltaBoard,
    running: bool,
    next_token: u64,
    last_applied_token: u64,
}

impl SessionCore {
    pub fn new(config: &SessionConfig, initial_asset: TrackedAsset) -> Self {
        Self {
            ledger: SessionLedger::new(config.starting_balance, config.log_capacity),
            resolver: SlugResolver::new(config.resolve_throttle()),
            selected_asset: initial_asset,
            selected_market_id: None,
            markets: Vec::new(),
            deltas: DeltaBoard::new(),
            running: false,
            next_token: 0,
            last_applied_token: 0,
        }
    }

    pub fn ledger(&self) -> &SessionLedger {
        &self.ledger
    }

    pub fn selected_asset(&self) -> TrackedAsset {
        self.selected_asset
    }

    pub fn markets(&self) -> &[Market] {
        &self.markets
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn delta(&self, market_id: &str) -> PriceDelta {
        self.deltas.get(market_id)
    }

    pub fn selected_market(&self) -> Option<&Market> {
        let id = self.selected_market_id.as_deref()?;
        self.markets.iter().find(|m| m.id == id)
    }

    /// Kick off the initial load.
    pub fn start(&mut self) -> Vec<Effect> {
        if self.resolver.begin_initial() {
            self.ledger.append_log("Loading markets...");
            vec![Effect::FetchInitial]
        } else {
            Vec::new()
        }
    }

    pub fn on_initial_loaded(
        &mut self,
        result: RegistryResult<HashMap<TrackedAsset, String>>,
        now: Instant,
    ) -> Vec<Effect> {
        match result {
            Ok(slugs) => {
                self.resolver.complete_initial(&slugs, now);
                self.ledger
                    .append_log(format!("Loaded {} active 15m events", slugs.len()));
                let asset = self.selected_asset;
                self.track_slug(asset, slugs.get(&asset).cloned())
            }
            Err(e) => {
                warn!(error = %e, "Initial slug load failed");
                self.resolver.fail_initial();
                self.ledger.append_log(format!("Error loading markets: {e}"));
                vec![Effect::RetryInitial]
            }
        }
    }

    /// Select an asset. Re-selecting the current asset only requests a
    /// throttled re-resolution; the ledger is never reset.
    pub fn select_asset(&mut self, asset: TrackedAsset, now: Instant) -> Vec<Effect> {
        let switched = asset != self.selected_asset;
        if switched {
            info!(from = %self.selected_asset, to = %asset, "Switching asset");
            self.selected_asset = asset;
            self.clear_markets();
        }

        if !self.resolver.is_loaded() {
            let mut effects = Vec::new();
            if switched {
                effects.push(Effect::StopRefreshCadence);
            }
            effects.extend(self.start());
            return effects;
        }

        match self.resolver.begin(asset, now) {
            ResolveDecision::Fetch if switched => {
                vec![Effect::StopRefreshCadence, Effect::FetchSlugMap { asset }]
            }
            ResolveDecision::Fetch => vec![Effect::FetchSlugMap { asset }],
            ResolveDecision::Throttled { remaining, cached } => {
                self.ledger.append_log(format!(
                    "Please wait {}s before refreshing {asset}",
                    remaining.as_secs_f64().ceil() as u64
                ));
                if switched {
                    self.track_slug(asset, cached)
                } else {
                    Vec::new()
                }
            }
        }
    }

    pub fn on_resolved(
        &mut self,
        asset: TrackedAsset,
        result: RegistryResult<HashMap<TrackedAsset, String>>,
    ) -> Vec<Effect> {
        let slugs = match result {
            Ok(slugs) => slugs,
            Err(e) => {
                warn!(%asset, error = %e, "Slug resolution failed");
                Metrics::slug_resolution(asset.symbol(), "failed");
                self.ledger.append_log(format!("Error resolving {asset}: {e}"));
                // The cadence retries the selected asset; a switch stopped it.
                return if asset == self.selected_asset {
                    vec![Effect::RestartRefreshCadence]
                } else {
                    Vec::new()
                };
            }
        };

        let slug = self.resolver.complete(asset, &slugs);
        if asset != self.selected_asset {
            debug!(%asset, "Resolution for deselected asset, cached only");
            return Vec::new();
        }
        self.track_slug(asset, slug)
    }

    /// Periodic refresh of the selected asset, or a throttled
    /// re-resolution while it has no active event.
    pub fn refresh_due(&mut self, now: Instant) -> Vec<Effect> {
        if !self.resolver.is_loaded() {
            return Vec::new();
        }
        let asset = self.selected_asset;
        match self.resolver.resolved_slug(asset).map(str::to_owned) {
            Some(slug) => vec![self.fetch_event(asset, slug)],
            None => self.request_resolution(asset, now),
        }
    }

    pub fn on_refreshed(
        &mut self,
        token: u64,
        asset: TrackedAsset,
        result: FeedResult<FetchedEvent>,
        now: Instant,
        wall_clock: DateTime<Utc>,
    ) -> Vec<Effect> {
        if asset != self.selected_asset || token <= self.last_applied_token {
            debug!(
                token,
                last_applied = self.last_applied_token,
                %asset,
                "Discarding stale refresh"
            );
            Metrics::refresh("stale");
            return Vec::new();
        }

        let event = match result {
            Ok(event) => event,
            Err(FeedError::EventNotFound(slug)) => {
                info!(%asset, %slug, "Event no longer available");
                Metrics::refresh("not_found");
                self.last_applied_token = token;
                self.clear_markets();
                self.ledger.append_log(format!("No active event for {asset}"));
                return self.request_resolution(asset, now);
            }
            Err(e) => {
                warn!(%asset, error = %e, "Refresh failed");
                Metrics::refresh("error");
                self.ledger.append_log(format!("Error fetching data: {e}"));
                return Vec::new();
            }
        };

        self.last_applied_token = token;
        Metrics::refresh("ok");

        let rollover = event.needs_rollover(wall_clock);
        let result = diff_markets(&self.markets, event.markets);
        self.markets = result.markets;

        let mut effects = Vec::with_capacity(result.deltas.len());
        for (market_id, delta) in result.deltas {
            self.deltas.apply(market_id.clone(), delta);
            effects.push(Effect::ScheduleDeltaClear { market_id });
        }

        let selection_valid = self
            .selected_market_id
            .as_deref()
            .is_some_and(|id| self.markets.iter().any(|m| m.id == id));
        if !selection_valid {
            self.selected_market_id = self.markets.first().map(|m| m.id.clone());
        }

        debug!(
            slug = %event.slug,
            markets = self.markets.len(),
            deltas = effects.len(),
            "Applied refresh"
        );

        if rollover {
            info!(%asset, slug = %event.slug, "Event ended, re-resolving");
            effects.extend(self.request_resolution(asset, now));
        }
        effects
    }

    /// Select a market by id. Unknown ids are ignored.
    pub fn select_market(&mut self, market_id: &str) -> bool {
        if self.markets.iter().any(|m| m.id == market_id) {
            self.selected_market_id = Some(market_id.to_string());
            true
        } else {
            debug!(%market_id, "Ignoring selection of unknown market");
            false
        }
    }

    pub fn set_running(&mut self, running: bool) -> Vec<Effect> {
        if running == self.running {
            return Vec::new();
        }
        self.running = running;
        if running {
            self.ledger.append_log("Bot started");
            vec![Effect::StartScan]
        } else {
            self.ledger.append_log("Bot stopped");
            vec![Effect::StopScan]
        }
    }

    /// One scanner tick against the selected market.
    pub fn tick(&mut self, scanner: &mut ArbScanner) {
        if !self.running {
            return;
        }
        let Some(market) = self.selected_market() else {
            return;
        };

        Metrics::scan_tick();
        match scanner.evaluate(market) {
            ScanOutcome::Opportunity(opportunity) => {
                info!(
                    market_id = %opportunity.market_id,
                    sum = opportunity.sum,
                    profit = opportunity.profit,
                    "Simulated trade"
                );
                self.ledger
                    .record_trade(opportunity.profit, opportunity.log_message());
            }
            ScanOutcome::NoEdge {
                log_line: Some(line),
                ..
            } => self.ledger.append_log(line),
            ScanOutcome::NoEdge { log_line: None, .. } => {}
        }
    }

    pub fn clear_delta(&mut self, market_id: &str) {
        self.deltas.clear(market_id);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            balance: self.ledger.balance(),
            starting_balance: self.ledger.starting_balance(),
            trade_history: self.ledger.trade_history().to_vec(),
            total_profit: self.ledger.total_profit(),
            trade_count: self.ledger.trade_count(),
            last_profit: self.ledger.last_profit(),
            log_lines: self.ledger.log_lines(),
            selected_asset: self.selected_asset,
            selected_market: self.selected_market().cloned(),
            markets: self.markets.clone(),
            deltas: self.deltas.active(),
            is_running: self.running,
            resolved_slugs: self.resolver.resolved_slugs(),
        }
    }

    fn track_slug(&mut self, asset: TrackedAsset, slug: Option<String>) -> Vec<Effect> {
        match slug {
            Some(slug) => {
                self.ledger.append_log(format!("Tracking {slug}"));
                vec![
                    self.fetch_event(asset, slug),
                    Effect::RestartRefreshCadence,
                ]
            }
            None => {
                self.clear_markets();
                self.ledger
                    .append_log(format!("No active 15m event for {asset}"));
                vec![Effect::RestartRefreshCadence]
            }
        }
    }

    fn request_resolution(&mut self, asset: TrackedAsset, now: Instant) -> Vec<Effect> {
        match self.resolver.begin(asset, now) {
            ResolveDecision::Fetch => vec![Effect::FetchSlugMap { asset }],
            ResolveDecision::Throttled { .. } => Vec::new(),
        }
    }

    fn fetch_event(&mut self, asset: TrackedAsset, slug: String) -> Effect {
        self.next_token += 1;
        Effect::FetchEvent {
            token: self.next_token,
            asset,
            slug,
        }
    }

    fn clear_markets(&mut self) {
        self.markets.clear();
        self.selected_market_id = None;
    }
}

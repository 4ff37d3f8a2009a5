//! Session actor.
//!
//! `SessionTask` runs in its own tokio task and is the only writer of the
//! session state. Network calls and timers run in spawned helper tasks
//! that report back as messages, so a slow fetch never blocks scanning.
//!
//! Helper tasks hold a weak sender: once every `SessionHandle` is dropped
//! the channel closes and the actor exits.
//!
//! `SessionHandle` republishes the state after every message into a
//! shared snapshot, so readers never need a channel round-trip.

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::state::{Effect, SessionCore, SessionSnapshot};
use chrono::Utc;
use parking_lot::RwLock;
use pm15_core::TrackedAsset;
use pm15_detector::ArbScanner;
use pm15_feed::{FeedResult, FetchedEvent, Refresher};
use pm15_registry::{fetch_slug_map, EventProvider, RegistryResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, MissedTickBehavior};
use tracing::{debug, info, trace};

/// Default capacity of the session channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

// ============================================================================
// SessionMsg
// ============================================================================

/// Messages for the session actor.
#[derive(Debug)]
pub enum SessionMsg {
    SelectAsset(TrackedAsset),
    SelectMarket(String),
    SetRunning(bool),

    /// Result of the initial slug load.
    InitialLoaded(RegistryResult<HashMap<TrackedAsset, String>>),
    /// Result of resolving one asset.
    Resolved {
        asset: TrackedAsset,
        result: RegistryResult<HashMap<TrackedAsset, String>>,
    },
    /// Result of one event fetch.
    Refreshed {
        token: u64,
        asset: TrackedAsset,
        result: FeedResult<FetchedEvent>,
    },

    /// Re-run a failed initial load.
    RetryInitial,
    RefreshDue,
    ScanTick,
    ClearDelta(String),

    Shutdown,
}

// ============================================================================
// SessionTask
// ============================================================================

pub struct SessionTask {
    rx: mpsc::Receiver<SessionMsg>,
    tx: mpsc::WeakSender<SessionMsg>,
    core: SessionCore,
    scanner: ArbScanner,
    provider: Arc<dyn EventProvider>,
    refresher: Refresher,
    config: SessionConfig,
    scan_interval: Duration,
    snapshot: Arc<RwLock<SessionSnapshot>>,
    refresh_timer: Option<JoinHandle<()>>,
    scan_timer: Option<JoinHandle<()>>,
}

impl SessionTask {
    /// Run the actor until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        debug!("SessionTask started");
        let effects = self.core.start();
        self.apply(effects);
        self.publish();

        while let Some(msg) = self.rx.recv().await {
            if matches!(msg, SessionMsg::Shutdown) {
                info!("SessionTask received shutdown");
                break;
            }
            self.handle_message(msg);
            self.publish();
        }

        self.stop_timers();
        self.publish();
        debug!("SessionTask terminated");
    }

    fn handle_message(&mut self, msg: SessionMsg) {
        let effects = match msg {
            SessionMsg::SelectAsset(asset) => self.core.select_asset(asset, now()),
            SessionMsg::SelectMarket(market_id) => {
                self.core.select_market(&market_id);
                Vec::new()
            }
            SessionMsg::SetRunning(running) => self.core.set_running(running),
            SessionMsg::InitialLoaded(result) => self.core.on_initial_loaded(result, now()),
            SessionMsg::Resolved { asset, result } => self.core.on_resolved(asset, result),
            SessionMsg::Refreshed {
                token,
                asset,
                result,
            } => self
                .core
                .on_refreshed(token, asset, result, now(), Utc::now()),
            SessionMsg::RetryInitial => self.core.start(),
            SessionMsg::RefreshDue => self.core.refresh_due(now()),
            SessionMsg::ScanTick => {
                self.core.tick(&mut self.scanner);
                Vec::new()
            }
            SessionMsg::ClearDelta(market_id) => {
                self.core.clear_delta(&market_id);
                Vec::new()
            }
            SessionMsg::Shutdown => Vec::new(),
        };
        self.apply(effects);
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            trace!(?effect, "Applying effect");
            match effect {
                Effect::FetchInitial => {
                    let provider = self.provider.clone();
                    self.spawn_request(async move {
                        SessionMsg::InitialLoaded(fetch_slug_map(provider.as_ref()).await)
                    });
                }
                Effect::RetryInitial => {
                    debug!(delay = ?self.config.resolve_throttle(), "Scheduling initial load retry");
                    self.spawn_delayed(self.config.resolve_throttle(), SessionMsg::RetryInitial);
                }
                Effect::FetchSlugMap { asset } => {
                    let provider = self.provider.clone();
                    self.spawn_request(async move {
                        let result = fetch_slug_map(provider.as_ref()).await;
                        SessionMsg::Resolved { asset, result }
                    });
                }
                Effect::FetchEvent { token, asset, slug } => {
                    let provider = self.provider.clone();
                    let refresher = self.refresher;
                    self.spawn_request(async move {
                        let result = refresher.fetch(provider.as_ref(), &slug).await;
                        SessionMsg::Refreshed {
                            token,
                            asset,
                            result,
                        }
                    });
                }
                Effect::RestartRefreshCadence => {
                    abort(self.refresh_timer.take());
                    self.refresh_timer = Some(self.spawn_cadence(
                        self.config.refresh_interval(),
                        || SessionMsg::RefreshDue,
                    ));
                }
                Effect::StopRefreshCadence => abort(self.refresh_timer.take()),
                Effect::StartScan => {
                    abort(self.scan_timer.take());
                    self.scan_timer =
                        Some(self.spawn_cadence(self.scan_interval, || SessionMsg::ScanTick));
                }
                Effect::StopScan => abort(self.scan_timer.take()),
                Effect::ScheduleDeltaClear { market_id } => {
                    self.spawn_delayed(self.config.delta_ttl(), SessionMsg::ClearDelta(market_id));
                }
            }
        }
    }

    /// Run a one-off request and deliver its result as a message.
    fn spawn_request<F>(&self, request: F)
    where
        F: std::future::Future<Output = SessionMsg> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let msg = request.await;
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(msg).await;
            }
        });
    }

    /// Deliver `msg` once `delay` has elapsed.
    fn spawn_delayed(&self, delay: Duration, msg: SessionMsg) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(msg).await;
            }
        });
    }

    /// Send a message every `period`, first one after one full period.
    fn spawn_cadence<F>(&self, period: Duration, make: F) -> JoinHandle<()>
    where
        F: Fn() -> SessionMsg + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(tx) = tx.upgrade() else {
                    break;
                };
                if tx.send(make()).await.is_err() {
                    break;
                }
            }
        })
    }

    fn stop_timers(&mut self) {
        abort(self.refresh_timer.take());
        abort(self.scan_timer.take());
    }

    fn publish(&self) {
        *self.snapshot.write() = self.core.snapshot();
    }
}

fn abort(timer: Option<JoinHandle<()>>) {
    if let Some(timer) = timer {
        timer.abort();
    }
}

/// Monotonic now that follows tokio's clock, including when paused.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

// ============================================================================
// SessionHandle
// ============================================================================

/// Handle for interacting with the session actor.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionMsg>,
    snapshot: Arc<RwLock<SessionSnapshot>>,
}

impl SessionHandle {
    pub async fn select_asset(&self, asset: TrackedAsset) -> SessionResult<()> {
        self.send(SessionMsg::SelectAsset(asset)).await
    }

    pub async fn select_market(&self, market_id: impl Into<String>) -> SessionResult<()> {
        self.send(SessionMsg::SelectMarket(market_id.into())).await
    }

    pub async fn set_running(&self, running: bool) -> SessionResult<()> {
        self.send(SessionMsg::SetRunning(running)).await
    }

    pub async fn shutdown(&self) -> SessionResult<()> {
        self.send(SessionMsg::Shutdown).await
    }

    /// Latest published state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.read().clone()
    }

    async fn send(&self, msg: SessionMsg) -> SessionResult<()> {
        self.tx
            .send(msg)
            .await
            .map_err(|_| SessionError::ChannelClosed)
    }
}

// ============================================================================
// Spawn
// ============================================================================

/// Everything the session actor needs besides its configuration.
pub struct SessionDeps {
    pub provider: Arc<dyn EventProvider>,
    pub refresher: Refresher,
    pub scanner: ArbScanner,
}

/// Spawn the session actor and return its handle.
///
/// The initial slug load starts immediately. Scanning stays off until
/// `set_running(true)`.
pub fn spawn_session(
    config: SessionConfig,
    initial_asset: TrackedAsset,
    deps: SessionDeps,
    capacity: usize,
) -> (SessionHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity);

    let core = SessionCore::new(&config, initial_asset);
    let snapshot = Arc::new(RwLock::new(core.snapshot()));
    let scan_interval = Duration::from_millis(deps.scanner.config().scan_interval_ms);

    let task = SessionTask {
        rx,
        tx: tx.downgrade(),
        core,
        scanner: deps.scanner,
        provider: deps.provider,
        refresher: deps.refresher,
        config,
        scan_interval,
        snapshot: snapshot.clone(),
        refresh_timer: None,
        scan_timer: None,
    };

    let handle = SessionHandle { tx, snapshot };
    let join_handle = tokio::spawn(task.run());

    (handle, join_handle)
}

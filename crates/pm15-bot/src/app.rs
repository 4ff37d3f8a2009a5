//! Main application.

use crate::config::AppConfig;
use crate::error::AppResult;
use pm15_detector::ArbScanner;
use pm15_feed::Refresher;
use pm15_registry::{EventProvider, GammaClient};
use pm15_session::{
    spawn_session, SessionDeps, SessionHandle, SessionSnapshot, DEFAULT_CHANNEL_CAPACITY,
};
use pm15_telemetry::Metrics;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Main application state.
pub struct Application {
    config: AppConfig,
    provider: Arc<dyn EventProvider>,
}

impl Application {
    /// Create a new application talking to the configured events API.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let client = GammaClient::new(
            config.gamma_url.clone(),
            config.tag_slug.clone(),
            config.request_timeout(),
        )?
        .with_event_limit(config.event_limit);

        Ok(Self::with_provider(config, Arc::new(client)))
    }

    /// Create an application on top of an arbitrary provider.
    pub fn with_provider(config: AppConfig, provider: Arc<dyn EventProvider>) -> Self {
        Self { config, provider }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Spawn the session actor and start scanning if configured to.
    pub async fn start_session(&self) -> AppResult<(SessionHandle, JoinHandle<()>)> {
        let deps = SessionDeps {
            provider: self.provider.clone(),
            refresher: Refresher::new(self.config.price_basis),
            scanner: ArbScanner::from_config(self.config.scanner.clone()),
        };

        let (handle, join) = spawn_session(
            self.config.session.clone(),
            self.config.default_asset,
            deps,
            DEFAULT_CHANNEL_CAPACITY,
        );

        if self.config.auto_start {
            handle.set_running(true).await?;
        }
        Ok((handle, join))
    }

    /// Run until ctrl-c, logging a status line periodically.
    pub async fn run(self) -> AppResult<()> {
        info!(
            asset = %self.config.default_asset,
            gamma_url = %self.config.gamma_url,
            simulation = self.config.scanner.simulation.enabled,
            "Starting application"
        );

        let (handle, mut join) = self.start_session().await?;
        let mut status_interval = tokio::time::interval(self.config.status_interval());
        // The first tick completes immediately; skip it.
        status_interval.tick().await;

        loop {
            tokio::select! {
                _ = status_interval.tick() => {
                    report_status(&handle.snapshot());
                }

                result = &mut join => {
                    warn!(?result, "Session task exited unexpectedly");
                    break;
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    if let Err(e) = handle.shutdown().await {
                        warn!(error = %e, "Session already stopped");
                    }
                    if let Err(e) = (&mut join).await {
                        warn!(error = %e, "Session task failed");
                    }
                    break;
                }
            }
        }

        let snapshot = handle.snapshot();
        info!("Final session summary:");
        info!("{}", final_summary(&snapshot));
        Ok(())
    }
}

fn report_status(snapshot: &SessionSnapshot) {
    Metrics::balance(snapshot.balance);
    info!("{}", status_line(snapshot));

    match Metrics::render() {
        Ok(text) => debug!(metrics = %text, "Metrics snapshot"),
        Err(e) => warn!(error = %e, "Failed to render metrics"),
    }
}

/// One-line session status.
pub fn status_line(snapshot: &SessionSnapshot) -> String {
    let last = snapshot
        .last_profit
        .map(|p| format!("+${p:.2}"))
        .unwrap_or_else(|| "-".to_string());

    let market = match &snapshot.selected_market {
        Some(market) => format!(
            "{} (Sum: {:.2})",
            market.short_question(30),
            market.price_sum()
        ),
        None => "no market".to_string(),
    };

    format!(
        "[{}] balance ${:.2} | trades {} | last {} | {} | {}",
        snapshot.selected_asset,
        snapshot.balance,
        snapshot.trade_count,
        last,
        if snapshot.is_running { "running" } else { "stopped" },
        market
    )
}

/// Multi-line summary printed on shutdown.
pub fn final_summary(snapshot: &SessionSnapshot) -> String {
    let pnl = snapshot.balance - snapshot.starting_balance;
    format!(
        "balance ${:.2} (start ${:.2}, pnl {:+.2}) | trades {} | total profit ${:.2}",
        snapshot.balance,
        snapshot.starting_balance,
        pnl,
        snapshot.trade_count,
        snapshot.total_profit
    )
}

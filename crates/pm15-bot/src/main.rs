//! pm15 short-window market scanner - Entry Point

use anyhow::Result;
use clap::Parser;
use pm15_core::TrackedAsset;
use tracing::info;

/// Short-window prediction market arbitrage scanner
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via PM15_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Asset to track at startup (BTC, ETH, SOL, XRP)
    #[arg(short, long)]
    asset: Option<TrackedAsset>,

    /// Do not start scanning automatically
    #[arg(long)]
    paused: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    pm15_telemetry::init_logging("info,pm15=debug")?;

    info!("Starting pm15 bot v{}", env!("CARGO_PKG_VERSION"));

    let mut config = pm15_bot::AppConfig::load(args.config)?;
    if let Some(asset) = args.asset {
        config.default_asset = asset;
    }
    if args.paused {
        config.auto_start = false;
    }
    info!(
        asset = %config.default_asset,
        auto_start = config.auto_start,
        price_basis = ?config.price_basis,
        "Configuration loaded"
    );

    let app = pm15_bot::Application::new(config)?;
    app.run().await?;

    Ok(())
}

//! GhostMarket decoupling signal processor - entry point.
//!
//! Watches per-asset price topics and a shared social sentiment topic and
//! emits a decoupling signal per asset every cycle.

use anyhow::{Context, Result};
use clap::Parser;
use ghost_processor::{AppConfig, Application};
use tracing::info;

/// GhostMarket decoupling signal processor
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via GHOST_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // TLS provider must be installed before the relay connects
    ghost_bus::init_crypto();

    let args = Args::parse();

    // Determine config path: CLI arg > GHOST_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("GHOST_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    let config = AppConfig::from_file(&config_path)
        .with_context(|| format!("loading configuration from {config_path}"))?;

    ghost_telemetry::init_logging(&config.telemetry.log_level)?;
    info!("Starting GhostMarket processor v{}", env!("CARGO_PKG_VERSION"));
    info!(
        config_path = %config_path,
        assets = config.assets.len(),
        scorer = ?config.scorer.kind,
        "Configuration loaded"
    );

    let app = Application::new(config)?;
    let summary = app.run().await?;
    info!(?summary, "Exited cleanly");

    Ok(())
}

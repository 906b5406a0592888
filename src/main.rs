//! Surge - Momentum Sniper Trading Bot
//!
//! Momentum-chasing entries with stop-loss / trailing take-profit exits,
//! honeypot screening and a time-boxed blacklist.

use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use surge::adapters::cli::{CliApp, Command, RunCmd, StatusCmd};
use surge::adapters::paper::{PaperExecutor, PaperMarket};
use surge::application::Scheduler;
use surge::config::{load_config, Config};
use surge::domain::persistence::StateFiles;
use surge::domain::unix_now;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in config.toml)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    init_logging(app.verbose, app.debug)?;

    match app.command {
        Command::Run(cmd) => run_command(cmd).await,
        Command::Status(cmd) => status_command(cmd).await,
    }
}

fn init_logging(verbose: bool, debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };

    fmt().with_env_filter(filter).init();
    Ok(())
}

async fn run_command(cmd: RunCmd) -> Result<()> {
    tracing::info!("Starting Surge sniper bot...");

    let config = load_run_config(&cmd)?;

    if !cmd.paper {
        // Live market-data and execution adapters are wired in by the
        // deployment; this binary ships the paper pair only.
        bail!(
            "no live market/execution adapter configured\n\n\
             Run with --paper for a simulated market and executor."
        );
    }

    tracing::warn!("PAPER TRADING MODE - no real transactions");

    let market = Arc::new(PaperMarket::demo(cmd.seed));
    let executor = Arc::new(
        PaperExecutor::new(&config.scheduler.quote_asset, cmd.balance).with_market(market.clone()),
    );

    let mut scheduler = Scheduler::new(&config, market, executor);
    scheduler
        .recover()
        .context("Failed to recover persisted state")?;

    // Ctrl+C stops the loop after the in-flight tick completes
    let shutdown = scheduler.shutdown_flag();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        shutdown.store(true, Ordering::SeqCst);
    });

    scheduler.run().await?;
    tracing::info!("Surge stopped");
    Ok(())
}

/// Load config, falling back to defaults for paper runs without a file
fn load_run_config(cmd: &RunCmd) -> Result<Config> {
    let path = Path::new(&cmd.config);
    if !path.exists() && cmd.paper {
        tracing::warn!(
            "Config not found at '{}' - using defaults for paper trading",
            cmd.config
        );
        return Ok(Config::default());
    }
    load_config(path).context("Failed to load configuration")
}

async fn status_command(cmd: StatusCmd) -> Result<()> {
    let path = Path::new(&cmd.config);
    let config = if path.exists() {
        load_config(path).context("Failed to load configuration")?
    } else {
        Config::default()
    };

    let files = StateFiles::new(config.scheduler.get_data_dir());
    let now = unix_now();

    match files.load_positions()? {
        Some(snapshot) if !snapshot.positions.is_empty() => {
            println!("Open positions: {}", snapshot.positions.len());
            for (id, position) in &snapshot.positions {
                println!(
                    "  {} ({}) entry {:.8} peak {:.8} tier {:?}",
                    position.symbol, id, position.entry_price, position.peak_price, position.tier
                );
            }
        }
        _ => println!("Open positions: 0"),
    }

    match files.load_blacklist()? {
        Some(snapshot) => {
            let active: Vec<_> = snapshot
                .blacklist
                .iter()
                .filter(|(_, expiry)| now < **expiry)
                .collect();
            println!("Blacklisted: {}", active.len());
            for (id, expiry) in active {
                let until = Utc
                    .timestamp_opt(*expiry as i64, 0)
                    .single()
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_else(|| expiry.to_string());
                println!("  {} until {}", id, until);
            }
        }
        None => println!("Blacklisted: 0"),
    }

    Ok(())
}

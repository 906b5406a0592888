//! CLI definition

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "surge-sniper", version, about = "Momentum sniper bot with trailing take-profit and honeypot screening")]
pub struct CliApp {
    /// Enable info-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug-level logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the trading loop
    Run(RunCmd),
    /// Show persisted positions and blacklist
    Status(StatusCmd),
}

#[derive(Debug, Args)]
pub struct RunCmd {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Paper trading mode - simulated market and executor, no transactions
    #[arg(long)]
    pub paper: bool,

    /// RNG seed for the paper market
    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    /// Starting quote-asset balance in paper mode
    #[arg(long, default_value_t = 10.0)]
    pub balance: f64,
}

#[derive(Debug, Args)]
pub struct StatusCmd {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

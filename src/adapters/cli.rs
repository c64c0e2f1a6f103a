//! CLI definitions
//!
//! Command-line surface for the rebalancer binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cointrader - mean-reversion rebalancer for a cointegrated pair
#[derive(Parser, Debug)]
#[command(
    name = "cointrader",
    version = env!("CARGO_PKG_VERSION"),
    about = "Mean-reversion rebalancer for a cointegrated instrument pair",
    long_about = "Cointrader trades the spread of a cointegrated basket: it combines \
                  instrument prices with a fixed (Johansen-derived) weight vector, \
                  z-scores the spread against its rolling history, and rebalances \
                  holdings toward unit_size * -z * weight per instrument."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the scheduled rebalance loop against the paper market
    Run(RunCmd),

    /// Execute a single rebalance cycle and print the outcome
    Cycle(CycleCmd),

    /// Load and validate the configuration file
    Validate(ValidateCmd),
}

/// Run the tick-driven rebalance loop
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// Seed for the paper market's generated price history
    #[arg(long, value_name = "SEED", default_value = "7")]
    pub seed: u64,
}

/// Execute one cycle now
#[derive(Parser, Debug)]
pub struct CycleCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// Seed for the paper market's generated price history
    #[arg(long, value_name = "SEED", default_value = "7")]
    pub seed: u64,
}

/// Validate configuration
#[derive(Parser, Debug)]
pub struct ValidateCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,
}

//! Cointrader - mean-reversion rebalancer binary
//!
//! Wires the paper adapters into the rebalance engine according to the
//! TOML configuration and drives it from the CLI.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use cointrader::adapters::cli::{CliApp, Command, CycleCmd, RunCmd, ValidateCmd};
use cointrader::adapters::{PaperBroker, PaperMarket};
use cointrader::config::{load_config, Config};
use cointrader::engine::{CycleOutcome, CyclePorts, RebalanceCycle, TickDriver};

#[tokio::main]
async fn main() -> Result<()> {
    // .env may override the log filter; config stays in config.toml
    dotenvy::dotenv().ok();

    let app = CliApp::parse();

    match app.command {
        Command::Run(cmd) => run_command(cmd, app.verbose, app.debug).await,
        Command::Cycle(cmd) => cycle_command(cmd, app.verbose, app.debug).await,
        Command::Validate(cmd) => validate_command(cmd).await,
    }
}

fn init_logging(verbose: bool, debug: bool, config_level: &str) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_level))
    };

    fmt().with_env_filter(filter).init();
    Ok(())
}

/// Build the cycle and paper collaborators from the configuration
fn build_cycle(config: &Config, seed: u64) -> Result<(RebalanceCycle, Arc<PaperBroker>)> {
    let weights = config.weight_set().context("Invalid weight set")?;
    let lookback_days = config.strategy.lookback_days;

    let market = Arc::new(PaperMarket::generate(
        &weights,
        lookback_days as usize,
        seed,
    ));
    let broker = Arc::new(PaperBroker::new(
        config.schedule.initial_cash,
        market.clone(),
    ));

    let cycle = RebalanceCycle::new(
        weights,
        Duration::days(i64::from(lookback_days)),
        config.strategy.resolution,
        config.strategy.unit_size,
        CyclePorts {
            history: market.clone(),
            feed: market.clone(),
            calendar: market,
            holdings: broker.clone(),
            gateway: broker.clone(),
        },
    );

    Ok((cycle, broker))
}

async fn run_command(cmd: RunCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    init_logging(verbose, debug, &config.logging.level)?;

    tracing::info!("Starting cointrader rebalance loop (paper market)");

    let (cycle, broker) = build_cycle(&config, cmd.seed)?;
    let driver = TickDriver::new(
        cycle,
        StdDuration::from_secs(config.schedule.tick_interval_secs),
        config.schedule.start_date,
        config.schedule.end_date,
    );

    let handle = driver.handle();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        handle.stop().await;
    });

    driver.run().await.context("Rebalance loop failed")?;

    tracing::info!(cash = %broker.cash(), fills = broker.fills().len(), "Cointrader stopped");
    Ok(())
}

async fn cycle_command(cmd: CycleCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    init_logging(verbose, debug, &config.logging.level)?;

    let (cycle, broker) = build_cycle(&config, cmd.seed)?;
    let outcome = cycle.run(Utc::now()).await.context("Cycle failed")?;

    match outcome {
        CycleOutcome::Rebalanced { signal, orders } => {
            println!("Rebalanced:");
            println!("  mean    = {}", signal.mean);
            println!("  std_dev = {}", signal.std_dev);
            println!("  z_score = {}", signal.z_score);
            for order in &orders {
                println!("  order: {} {}", order.instrument, order.quantity);
            }
            for (instrument, qty, price) in broker.fills() {
                println!("  fill: {instrument} {qty} @ {price}");
            }
        }
        CycleOutcome::Skipped(reason) => {
            println!("Skipped: {reason}");
        }
    }
    Ok(())
}

async fn validate_command(cmd: ValidateCmd) -> Result<()> {
    let config = load_config(&cmd.config).context("Configuration invalid")?;
    let weights = config.weight_set()?;

    println!("Configuration OK: {}", cmd.config.display());
    println!(
        "  schedule: {} to {} at {} (tick {}s)",
        config.schedule.start_date,
        config.schedule.end_date,
        config.schedule.rebalance_time,
        config.schedule.tick_interval_secs
    );
    println!(
        "  strategy: lookback {} days, unit size {}, {} bars",
        config.strategy.lookback_days, config.strategy.unit_size, config.strategy.resolution
    );
    for (instrument, weight) in weights.iter() {
        println!("  weight: {instrument} = {weight}");
    }
    Ok(())
}

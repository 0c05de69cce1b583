//! optbench CLI
//!
//! # Run a single backtest
//! optbench run --config config/default.toml --data data/prices
//!
//! # Print the transaction log and the summary as JSON
//! optbench run --config config/default.toml --data data/prices --transactions --json
//!
//! # Run the parameter sweep from the config's [sweep] section
//! optbench sweep --config config/default.toml --data data/prices --output results/sweep.json

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use optbench::backtest::Backtest;
use optbench::config::RunConfig;
use optbench::data::{DataLoader, HistoricalVolatility, MarketData};
use optbench::sweep::SweepRunner;

const SEPARATOR: &str = "============================================================";

#[derive(Parser)]
#[command(name = "optbench")]
#[command(about = "Event-driven backtesting for equity and options strategies")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single backtest with given configuration
    Run {
        /// Path to configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Directory of <TICKER>.parquet / <TICKER>.csv close files
        #[arg(short, long, default_value = "data/prices")]
        data: String,

        /// Print every transaction
        #[arg(long)]
        transactions: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run every strategy in the sweep grid over the same data
    Sweep {
        /// Path to configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Directory of <TICKER>.parquet / <TICKER>.csv close files
        #[arg(short, long, default_value = "data/prices")]
        data: String,

        /// Write all results as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of results to print
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

/// Fail early, listing what the data directory holds, when a configured
/// ticker has no price file.
fn check_tickers(loader: &DataLoader, data: &str, tickers: &[String]) -> Result<()> {
    let available = loader
        .available_tickers()
        .with_context(|| format!("listing {}", data))?;
    let missing: Vec<&str> = tickers
        .iter()
        .filter(|t| !available.contains(t))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        bail!(
            "no price file for {} in {} (available: {})",
            missing.join(", "),
            data,
            available.join(", ")
        );
    }
    info!("Using {} of {} tickers in {}: {}", tickers.len(), available.len(), data, tickers.join(", "));
    Ok(())
}

fn cmd_run(config: PathBuf, data: String, transactions: bool, json: bool) -> Result<()> {
    let run_config = RunConfig::load(&config)
        .with_context(|| format!("loading config {}", config.display()))?;
    let loader = DataLoader::new(&data);
    check_tickers(&loader, &data, &run_config.backtest.tickers)?;

    let strategy = run_config.strategy.build();
    let mut backtest = Backtest::from_source(run_config.backtest, strategy, &loader)
        .context("preparing backtest")?;
    backtest.run();

    if transactions {
        println!("{}", SEPARATOR);
        println!("Transactions ({})", backtest.transactions().len());
        println!("{}", SEPARATOR);
        for tx in backtest.transactions() {
            println!("{}", tx);
        }
        println!();
    }

    let stats = backtest.summary_statistics();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Strategy: {}", backtest.strategy_name());
        println!("{}", stats.summary());

        if let Some(prices) = backtest.last_prices() {
            let mut positions = backtest.portfolio().positions().peekable();
            if positions.peek().is_some() {
                println!("\nOpen positions:");
            }
            for position in positions {
                let price = prices.get(&position.ticker).copied().unwrap_or_default();
                println!(
                    "  {:<6} {:>10} sh  avg {:>10.2}  last {:>10.2}  unrealized {:>+12.2}",
                    position.ticker,
                    position.shares,
                    position.avg_cost,
                    price,
                    position.unrealized_pnl(price)
                );
            }
        }
    }

    Ok(())
}

fn cmd_sweep(config: PathBuf, data: String, output: Option<PathBuf>, top: usize) -> Result<()> {
    let run_config = RunConfig::load(&config)
        .with_context(|| format!("loading config {}", config.display()))?;
    let backtest = run_config.backtest;
    let loader = DataLoader::new(&data);
    check_tickers(&loader, &data, &backtest.tickers)?;
    let volatility = HistoricalVolatility::new(&loader, backtest.volatility_window);

    let market = MarketData::load(
        &backtest.tickers,
        backtest.start_date,
        backtest.end_date,
        &loader,
        &volatility,
    )
    .with_context(|| format!("loading market data from {}", data))?;

    let cases = run_config.sweep.cases(run_config.strategy.ticker());
    println!("{}", SEPARATOR);
    println!(
        "Sweep: {} cases over {} trading days",
        cases.len(),
        market.calendar().len()
    );
    println!("{}", SEPARATOR);

    let pb = ProgressBar::new(cases.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );
    let hook = pb.clone();

    let runner = SweepRunner::new(backtest, Arc::new(market))
        .context("preparing sweep")?
        .with_progress(move |done, _| hook.set_position(done as u64));
    let results = runner.run(&cases);
    pb.finish_with_message("done");

    println!(
        "\n{:<28} {:>10} {:>10} {:>10} {:>8}",
        "Case", "Return %", "Sharpe", "MaxDD %", "Trades"
    );
    for result in results.iter().take(top) {
        println!(
            "{:<28} {:>10.2} {:>10.2} {:>10.2} {:>8}",
            result.label,
            result.statistics.total_return_pct,
            result.statistics.sharpe_ratio,
            result.statistics.max_drawdown_pct,
            result.transactions
        );
    }

    if let Some(path) = output {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(&results)?)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("\nResults written to {}", path.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("optbench=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            data,
            transactions,
            json,
        } => cmd_run(config, data, transactions, json)?,
        Commands::Sweep {
            config,
            data,
            output,
            top,
        } => cmd_sweep(config, data, output, top)?,
    }

    Ok(())
}

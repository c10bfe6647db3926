//! # Scan the market and print this month's orders
//! dca-matrix scan --budget 100 --reserve 50
//!
//! # Same, with custom thresholds and JSON output
//! dca-matrix --config config/default.toml scan --budget 250 --reserve 0 --format json
//!
//! # Evaluate offline from known readings
//! dca-matrix evaluate --price 400 --sma50 410 --sma200 420 --vix 15 --budget 100 --reserve 50
//!
//! # Print the effective configuration
//! dca-matrix config

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use tracing::debug;

use dca_matrix::{evaluate, render_report, scan, CashFlow, Evaluation, MarketSnapshot, MatrixConfig, YahooClient};

#[derive(Parser)]
#[command(name = "dca-matrix")]
#[command(about = "Regime-driven monthly DCA orders for covered-call income ETFs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch live market data and produce this month's orders
    Scan {
        /// DCA budget for this month (USD)
        #[arg(long, default_value = "100")]
        budget: Decimal,

        /// Cash reserve carried from previous months (USD)
        #[arg(long, default_value = "50")]
        reserve: Decimal,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Produce orders from explicit market readings, without fetching
    Evaluate {
        /// Latest benchmark close
        #[arg(long)]
        price: f64,

        /// Fast moving average
        #[arg(long)]
        sma50: f64,

        /// Slow moving average
        #[arg(long)]
        sma200: f64,

        /// Volatility index reading
        #[arg(long)]
        vix: f64,

        #[arg(long, default_value = "100")]
        budget: Decimal,

        #[arg(long, default_value = "50")]
        reserve: Decimal,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn load_config(path: Option<&PathBuf>) -> Result<MatrixConfig> {
    match path {
        Some(p) => MatrixConfig::from_toml(p)
            .with_context(|| format!("Failed to load config from {}", p.display())),
        None => Ok(MatrixConfig::default()),
    }
}

fn print_evaluation(eval: &Evaluation, config: &MatrixConfig, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print!("{}", render_report(eval, config, Utc::now())),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(eval)?),
    }
    Ok(())
}

async fn cmd_scan(config: &MatrixConfig, cash: CashFlow, format: OutputFormat) -> Result<()> {
    let mut client = YahooClient::new(config.data.request_timeout())
        .context("Failed to build market data client")?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(format!(
        "Scanning {} and {}...",
        config.data.benchmark_symbol, config.data.volatility_symbol
    ));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = scan(&mut client, &cash, config).await;
    spinner.finish_and_clear();
    debug!("Market data requests made: {}", client.request_count());

    let eval = result.context("Market scan failed")?;
    print_evaluation(&eval, config, format)
}

fn cmd_evaluate(
    config: &MatrixConfig,
    snapshot: MarketSnapshot,
    cash: CashFlow,
    format: OutputFormat,
) -> Result<()> {
    let eval = evaluate(&snapshot, &cash, config).context("Evaluation failed")?;
    print_evaluation(&eval, config, format)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so JSON on stdout stays parseable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dca_matrix=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Scan {
            budget,
            reserve,
            format,
        } => {
            cmd_scan(&config, CashFlow::new(budget, reserve), format).await?;
        }
        Commands::Evaluate {
            price,
            sma50,
            sma200,
            vix,
            budget,
            reserve,
            format,
        } => {
            let snapshot = MarketSnapshot::new(price, sma50, sma200, vix);
            cmd_evaluate(&config, snapshot, CashFlow::new(budget, reserve), format)?;
        }
        Commands::Config => {
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}

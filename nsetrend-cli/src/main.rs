//! NSE Trend CLI: analyze and symbol lookup commands.
//!
//! Commands:
//! - `analyze`: fetch, align and analyze one or more NSE/BSE symbols, print JSON
//! - `symbols`: list or search the listing directory

use anyhow::{bail, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use nsetrend_core::data::{CircuitBreaker, DataProvider, SyntheticProvider, YahooProvider};
use nsetrend_core::symbols::SymbolDirectory;
use nsetrend_core::{
    AnalysisRequest, Engine, EngineConfig, Exchange, Granularity, Lookback, MetricSpec,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "nsetrend",
    about = "NSE Trend: historical price aggregation and trend analytics"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze symbols and print the result as JSON.
    Analyze {
        /// Symbols to analyze (e.g., RELIANCE TCS.NS BSE:INFY).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Start date (YYYY-MM-DD). Conflicts with --period.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Lookback preset ending at --end: 1m, 3m, 6m, 1y, 2y, 5y. Defaults to 1y.
        #[arg(long)]
        period: Option<String>,

        /// Metric to compute, repeatable (e.g., "moving_average(20)", pct_return, "rsi(14)").
        #[arg(long = "metric")]
        metrics: Vec<String>,

        /// daily or weekly.
        #[arg(long, default_value = "daily")]
        granularity: String,

        /// Path to an engine config TOML file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Use deterministic synthetic data instead of Yahoo Finance.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Pretty-print the JSON output.
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// List or search known listings.
    Symbols {
        /// EQUITY_L.csv style file. Defaults to the built-in list.
        #[arg(long)]
        directory: Option<PathBuf>,

        /// Case-insensitive match on symbol or company name.
        #[arg(long)]
        search: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            symbols,
            start,
            end,
            period,
            metrics,
            granularity,
            config,
            synthetic,
            pretty,
        } => run_analyze(AnalyzeArgs {
            symbols,
            start,
            end,
            period,
            metrics,
            granularity,
            config,
            synthetic,
            pretty,
        }),
        Commands::Symbols { directory, search } => run_symbols(directory, search),
    }
}

struct AnalyzeArgs {
    symbols: Vec<String>,
    start: Option<String>,
    end: Option<String>,
    period: Option<String>,
    metrics: Vec<String>,
    granularity: String,
    config: Option<PathBuf>,
    synthetic: bool,
    pretty: bool,
}

fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    let today = Utc::now().with_timezone(&Exchange::Nse.utc_offset()).date_naive();
    let (start, end) = resolve_range(
        args.start.as_deref(),
        args.end.as_deref(),
        args.period.as_deref(),
        today,
    )?;
    let metrics = parse_metrics(&args.metrics)?;
    let granularity = match args.granularity.parse::<Granularity>() {
        Ok(g) => g,
        Err(e) => bail!(e),
    };

    let provider: Arc<dyn DataProvider> = if args.synthetic {
        info!("using synthetic data");
        Arc::new(SyntheticProvider::default())
    } else {
        let breaker = Arc::new(CircuitBreaker::from_config(&config.circuit_breaker));
        Arc::new(YahooProvider::new(&config.provider, breaker)?)
    };

    let engine = Engine::from_config(&config, provider)?;
    let request = AnalysisRequest::new(&args.symbols, start, end)
        .with_metrics(metrics)
        .with_granularity(granularity);
    let result = engine.analyze(&request)?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{json}");
    Ok(())
}

fn run_symbols(directory: Option<PathBuf>, search: Option<String>) -> Result<()> {
    let directory = match directory {
        Some(path) => SymbolDirectory::from_csv_path(&path)?,
        None => SymbolDirectory::fallback(),
    };

    let listings = directory.search(search.as_deref().unwrap_or(""));
    if listings.is_empty() {
        bail!("no listings match");
    }
    for listing in listings {
        println!("{:<16} {}", listing.symbol, listing.name);
    }
    Ok(())
}

/// Work out `(start, end)` from explicit dates or a lookback preset.
fn resolve_range(
    start: Option<&str>,
    end: Option<&str>,
    period: Option<&str>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate)> {
    let end = end
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()?
        .unwrap_or(today);

    match (start, period) {
        (Some(_), Some(_)) => bail!("--start and --period are mutually exclusive"),
        (Some(s), None) => Ok((NaiveDate::parse_from_str(s, "%Y-%m-%d")?, end)),
        (None, period) => {
            let lookback = match period.unwrap_or("1y").parse::<Lookback>() {
                Ok(l) => l,
                Err(e) => bail!(e),
            };
            Ok(lookback.range_ending(end))
        }
    }
}

fn parse_metrics(raw: &[String]) -> Result<Vec<MetricSpec>> {
    if raw.is_empty() {
        return Ok(MetricSpec::defaults());
    }
    raw.iter()
        .map(|s| match s.parse::<MetricSpec>() {
            Ok(spec) => Ok(spec),
            Err(e) => bail!(e),
        })
        .collect()
}

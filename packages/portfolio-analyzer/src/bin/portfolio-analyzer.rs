//! Portfolio Analyzer CLI - risk and performance metrics from price or return files.
//!
//! Every command prints a JSON `ApiResponse` envelope on stdout. Logs go to stderr.

use anyhow::Result;
use clap::{Parser, Subcommand};
use portfolio_analyzer::{
    AnalyzerConfig, ApiResponse, InMemoryPriceSource, Lookback, PortfolioAnalyzer,
    PortfolioReturns, ReturnPoint, ReturnSeries, UndefinedRatioPolicy, Weights,
};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "portfolio-analyzer")]
#[command(about = "Portfolio risk & performance analyzer")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $PORTFOLIO_ANALYZER_CONFIG or the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a weighted basket of securities from a JSON price file
    Analyze {
        /// JSON file of daily close prices keyed by symbol
        #[arg(short, long)]
        prices: PathBuf,
        /// Symbols to analyze (comma-separated)
        #[arg(short, long)]
        tickers: String,
        /// Weights in ticker order (comma-separated, must sum to 1.0; equal weights if omitted)
        #[arg(short, long)]
        weights: Option<String>,
        /// Lookback window: 3mo, 6mo, 1y, 2y, 5y
        #[arg(long)]
        period: Option<Lookback>,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Compute metrics directly from a JSON file of dated portfolio returns
    Metrics {
        /// JSON array of {"date", "return"} objects
        #[arg(short, long)]
        returns: PathBuf,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Show the effective configuration
    Config,
}

#[derive(clap::Args)]
struct Overrides {
    /// Annual risk-free rate (0.0435 = 4.35%)
    #[arg(long)]
    risk_free_rate: Option<f64>,
    /// Fail instead of reporting undefined Sharpe/Sortino ratios
    #[arg(long)]
    strict: bool,
}

impl Overrides {
    fn apply(&self, config: &mut AnalyzerConfig) {
        if let Some(rate) = self.risk_free_rate {
            config.risk_free_rate = rate;
        }
        if self.strict {
            config.undefined_ratio = UndefinedRatioPolicy::Error;
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AnalyzerConfig::from_path(path),
        None => AnalyzerConfig::load(),
    };

    let output = match config {
        Ok(config) => match cli.command {
            Commands::Analyze {
                prices,
                tickers,
                weights,
                period,
                overrides,
            } => render(handle_analyze(config, prices, &tickers, weights, period, &overrides))?,
            Commands::Metrics { returns, overrides } => {
                render(handle_metrics(config, returns, &overrides))?
            }
            Commands::Config => render(Ok(config))?,
        },
        Err(e) => render::<()>(Err(e))?,
    };

    println!("{}", output);
    Ok(())
}

fn render<T: Serialize>(result: portfolio_analyzer::Result<T>) -> Result<String> {
    if let Err(e) = &result {
        tracing::error!(error = %e, "command failed");
    }
    Ok(serde_json::to_string_pretty(&ApiResponse::from(result))?)
}

fn handle_analyze(
    mut config: AnalyzerConfig,
    prices: PathBuf,
    tickers: &str,
    weights: Option<String>,
    period: Option<Lookback>,
    overrides: &Overrides,
) -> portfolio_analyzer::Result<portfolio_analyzer::AnalysisReport> {
    overrides.apply(&mut config);
    if let Some(period) = period {
        config.lookback = period;
    }
    config.validate()?;

    let tickers: Vec<String> = tickers.split(',').map(|s| s.trim().to_string()).collect();
    let weights = weights.as_deref().map(parse_weights).transpose()?;

    let mut source = InMemoryPriceSource::from_json_file(&prices)?;
    PortfolioAnalyzer::new(config).analyze(&mut source, &tickers, weights)
}

fn handle_metrics(
    mut config: AnalyzerConfig,
    returns: PathBuf,
    overrides: &Overrides,
) -> portfolio_analyzer::Result<portfolio_analyzer::PortfolioMetrics> {
    overrides.apply(&mut config);
    config.validate()?;

    let content = fs::read_to_string(&returns)?;
    let points: Vec<ReturnPoint> = serde_json::from_str(&content)?;
    let series = PortfolioReturns::from(ReturnSeries::from_points(&points)?);

    config.engine().compute_metrics(&series)
}

fn parse_weights(input: &str) -> portfolio_analyzer::Result<Weights> {
    let weights = input
        .split(',')
        .map(|s| {
            s.trim().parse::<f64>().map_err(|_| {
                portfolio_analyzer::Error::Data(format!("'{}' is not a valid weight", s.trim()))
            })
        })
        .collect::<portfolio_analyzer::Result<Vec<f64>>>()?;
    Weights::new(weights)
}

//! Portfolio Analyzer - risk and performance metrics for a weighted basket of securities.
//!
//! This crate provides:
//!
//! - **Return derivation**: daily percentage returns from close prices, aligned across assets
//! - **Metrics engine**: weighted portfolio returns, annualized return and volatility,
//!   Sharpe ratio, Sortino ratio, maximum drawdown
//! - **Data sources**: the `PriceSource` contract plus an in-memory, JSON-backed implementation
//! - **Configuration**: risk-free rate, lookback window and validation tolerances from TOML
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use portfolio_analyzer::{MetricsEngine, ReturnMatrix, Weights};
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
//! let dates: Vec<_> = (0..4).map(|i| start + chrono::Days::new(i)).collect();
//! let matrix = ReturnMatrix::new(
//!     dates,
//!     vec!["AAPL".into(), "MSFT".into()],
//!     vec![
//!         vec![0.010, 0.020],
//!         vec![-0.010, 0.000],
//!         vec![0.005, -0.004],
//!         vec![0.002, 0.006],
//!     ],
//! )
//! .unwrap();
//!
//! let engine = MetricsEngine::new();
//! let portfolio = engine
//!     .compute_portfolio_returns(&matrix, &Weights::equal(2))
//!     .unwrap();
//! let metrics = engine.compute_metrics(&portfolio).unwrap();
//! println!("Annual return: {:.4}", metrics.annual_return);
//! ```

pub mod config;
pub mod data;
pub mod portfolio;
pub mod types;

// Re-export commonly used types
pub use types::{
    ApiResponse, Lookback, Metric, PortfolioMetrics, PortfolioReturns, PricePoint, ReturnMatrix,
    ReturnPoint, ReturnSeries, Weights,
};

// Re-export main functionality
pub use config::AnalyzerConfig;
pub use data::{load_return_matrix, InMemoryPriceSource, PriceSource, PriceTable};
pub use portfolio::{
    align_returns, compute_portfolio_returns, max_drawdown, pct_change, AnalysisReport,
    Interpretation, MetricsEngine, PortfolioAnalyzer, RiskLevel, SharpeRating,
    UndefinedRatioPolicy, DEFAULT_RISK_FREE_RATE,
};

/// Error types for portfolio-analyzer operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid data: {0}")]
    Data(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Undefined ratio: {0} has a zero or undefined denominator")]
    UndefinedRatio(Metric),

    #[error("No data for symbol: {0}")]
    SymbolNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for portfolio-analyzer operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Portfolio analytics module.
//!
//! Provides return derivation, the metrics engine, and end-to-end analysis.

mod analysis;
mod metrics;
mod returns;

pub use analysis::{AnalysisReport, Interpretation, PortfolioAnalyzer, RiskLevel, SharpeRating};
pub use metrics::{
    compute_portfolio_returns, downside_deviation, max_drawdown, mean, sample_std_dev,
    trading_days_per_year, MetricsEngine, UndefinedRatioPolicy, DEFAULT_RISK_FREE_RATE,
};
pub use returns::{align_returns, pct_change};

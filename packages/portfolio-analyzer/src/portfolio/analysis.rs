//! End-to-end portfolio analysis.

use crate::config::AnalyzerConfig;
use crate::data::{load_return_matrix, PriceSource};
use crate::types::{Lookback, PortfolioMetrics, Weights};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Qualitative rating of a Sharpe ratio.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SharpeRating {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl SharpeRating {
    pub fn from_sharpe(sharpe: f64) -> Self {
        if sharpe > 1.0 {
            SharpeRating::Excellent
        } else if sharpe > 0.5 {
            SharpeRating::Good
        } else if sharpe > 0.0 {
            SharpeRating::Fair
        } else {
            SharpeRating::Poor
        }
    }
}

/// Qualitative risk level from annual volatility.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn from_volatility(annual_volatility: f64) -> Self {
        if annual_volatility < 0.15 {
            RiskLevel::Low
        } else if annual_volatility < 0.25 {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }
}

/// Plain-language reading of the metrics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Interpretation {
    pub risk_level: RiskLevel,
    /// `None` when the Sharpe ratio is undefined
    pub sharpe_rating: Option<SharpeRating>,
}

impl Interpretation {
    pub fn from_metrics(metrics: &PortfolioMetrics) -> Self {
        Self {
            risk_level: RiskLevel::from_volatility(metrics.annual_volatility),
            sharpe_rating: metrics.sharpe_ratio.map(SharpeRating::from_sharpe),
        }
    }
}

/// Result of analyzing one portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Symbols, in weight order
    pub tickers: Vec<String>,
    /// Weights actually applied
    pub weights: Weights,
    /// Lookback window of the price data
    pub lookback: Lookback,
    /// Annual risk-free rate used for the ratios
    pub risk_free_rate: f64,
    /// First portfolio return date
    pub start_date: NaiveDate,
    /// Last portfolio return date
    pub end_date: NaiveDate,
    /// Number of daily return observations
    pub observations: usize,
    pub metrics: PortfolioMetrics,
    pub interpretation: Interpretation,
}

/// Runs the full pipeline: prices -> aligned returns -> weighted series -> metrics.
#[derive(Debug, Clone, Default)]
pub struct PortfolioAnalyzer {
    config: AnalyzerConfig,
}

impl PortfolioAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze a portfolio.
    ///
    /// # Arguments
    ///
    /// * `source` - Where prices come from
    /// * `tickers` - Symbols (trimmed and upper-cased; blanks are ignored)
    /// * `weights` - Per-symbol weights, or `None` for equal weights
    ///
    /// Weights that fail the normalization check are replaced by equal weights
    /// with a warning.
    pub fn analyze<S: PriceSource + ?Sized>(
        &self,
        source: &mut S,
        tickers: &[String],
        weights: Option<Weights>,
    ) -> Result<AnalysisReport> {
        let tickers = normalize_tickers(tickers);
        if tickers.is_empty() {
            return Err(Error::Data("at least one ticker is required".to_string()));
        }

        let weights = self.resolve_weights(tickers.len(), weights)?;
        let matrix = load_return_matrix(source, &tickers, self.config.lookback)?;

        let engine = self.config.engine();
        let returns = engine.compute_portfolio_returns(&matrix, &weights)?;
        let metrics = engine.compute_metrics(&returns)?;

        // compute_metrics succeeded, so there are at least 2 dated returns
        let (start_date, end_date) = match (returns.dates().first(), returns.dates().last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(Error::InsufficientData("no portfolio returns".to_string())),
        };

        info!(
            tickers = ?tickers,
            observations = returns.len(),
            annual_return = metrics.annual_return,
            annual_volatility = metrics.annual_volatility,
            "portfolio analysis complete"
        );

        Ok(AnalysisReport {
            tickers,
            weights,
            lookback: self.config.lookback,
            risk_free_rate: engine.risk_free_rate(),
            start_date,
            end_date,
            observations: returns.len(),
            interpretation: Interpretation::from_metrics(&metrics),
            metrics,
        })
    }

    fn resolve_weights(&self, asset_count: usize, weights: Option<Weights>) -> Result<Weights> {
        let Some(weights) = weights else {
            return Ok(Weights::equal(asset_count));
        };

        if weights.len() != asset_count {
            return Err(Error::Data(format!(
                "{} weights given for {} tickers",
                weights.len(),
                asset_count
            )));
        }

        match weights.validate_normalized(self.config.weight_tolerance) {
            Ok(()) => Ok(weights),
            Err(e) => {
                warn!(error = %e, "using equal weights instead");
                Ok(Weights::equal(asset_count))
            }
        }
    }
}

fn normalize_tickers(tickers: &[String]) -> Vec<String> {
    tickers
        .iter()
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect()
}

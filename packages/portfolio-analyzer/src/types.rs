//! Core data types for portfolio analysis.

use crate::{Error, Result};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A daily adjusted close price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    /// Trading date
    pub date: NaiveDate,
    /// Adjusted close price
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// A single dated return, as read from a returns file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ReturnPoint {
    /// Trading date
    pub date: NaiveDate,
    /// Return for the date (e.g., 0.01 for 1%)
    #[serde(rename = "return")]
    pub value: f64,
}

/// An ordered series of daily returns sharing one date index.
///
/// Dates are strictly ascending, there is exactly one value per date, and
/// every value is finite.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct ReturnSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl ReturnSeries {
    /// Create a return series, checking that dates and values line up, dates are
    /// strictly ascending and values are finite.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(Error::Data(format!(
                "return series has {} dates but {} values",
                dates.len(),
                values.len()
            )));
        }

        if let Some(pair) = dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(Error::Data(format!(
                "return series dates are not strictly ascending: {} follows {}",
                pair[1], pair[0]
            )));
        }

        if let Some((date, value)) = dates.iter().zip(&values).find(|(_, v)| !v.is_finite()) {
            return Err(Error::Data(format!("return on {} is not a finite number: {}", date, value)));
        }

        Ok(Self { dates, values })
    }

    /// Build a series from dated points.
    pub fn from_points(points: &[ReturnPoint]) -> Result<Self> {
        let dates = points.iter().map(|p| p.date).collect();
        let values = points.iter().map(|p| p.value).collect();
        Self::new(dates, values)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }
}

/// Daily returns for several assets on a common date index.
///
/// One row per date, one column per symbol.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReturnMatrix {
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl ReturnMatrix {
    /// Create a matrix, checking that every row has one finite value per symbol.
    ///
    /// An empty matrix is allowed here; the metrics engine rejects it.
    pub fn new(dates: Vec<NaiveDate>, symbols: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if dates.len() != rows.len() {
            return Err(Error::Data(format!(
                "return matrix has {} dates but {} rows",
                dates.len(),
                rows.len()
            )));
        }

        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != symbols.len())
        {
            return Err(Error::Data(format!(
                "row {} ({}) has {} values, expected {}",
                i,
                dates[i],
                row.len(),
                symbols.len()
            )));
        }

        if let Some((i, value)) = rows
            .iter()
            .enumerate()
            .find_map(|(i, row)| row.iter().find(|v| !v.is_finite()).map(|v| (i, *v)))
        {
            return Err(Error::Data(format!(
                "row {} ({}) holds a non-finite return: {}",
                i, dates[i], value
            )));
        }

        Ok(Self {
            dates,
            symbols,
            rows,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of dates (T).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of assets (N).
    pub fn asset_count(&self) -> usize {
        self.symbols.len()
    }

    /// Returns of a single asset as its own series.
    pub fn column(&self, symbol: &str) -> Option<ReturnSeries> {
        let idx = self.symbols.iter().position(|s| s == symbol)?;
        Some(ReturnSeries {
            dates: self.dates.clone(),
            values: self.rows.iter().map(|row| row[idx]).collect(),
        })
    }
}

/// Per-asset weights, in the same order as the asset list.
///
/// Weights are not required to sum to 1.0. Results scale proportionally with
/// non-normalized weights.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(into = "Vec<f64>", try_from = "Vec<f64>")]
pub struct Weights(Vec<f64>);

impl Weights {
    /// Create a weight vector. Every weight must be finite.
    pub fn new(weights: Vec<f64>) -> Result<Self> {
        if let Some(w) = weights.iter().find(|w| !w.is_finite()) {
            return Err(Error::Data(format!("weight {} is not a finite number", w)));
        }
        Ok(Self(weights))
    }

    /// Equal weights of `1/n` for `n` assets.
    pub fn equal(n: usize) -> Self {
        Self(vec![1.0 / n as f64; n])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Multiply every weight by `k`.
    pub fn scaled(&self, k: f64) -> Self {
        Self(self.0.iter().map(|w| w * k).collect())
    }

    /// Check that each weight lies in `[0, 1]` and the weights sum to 1.0 within `tolerance`.
    pub fn validate_normalized(&self, tolerance: f64) -> Result<()> {
        if let Some(w) = self.0.iter().find(|w| !(0.0..=1.0).contains(*w)) {
            return Err(Error::Data(format!("weight {} must be between 0 and 1", w)));
        }

        let total = self.sum();
        if (total - 1.0).abs() > tolerance {
            return Err(Error::Data(format!(
                "weights sum to {:.3}, should sum to 1.0",
                total
            )));
        }

        Ok(())
    }
}

impl TryFrom<Vec<f64>> for Weights {
    type Error = Error;

    fn try_from(weights: Vec<f64>) -> Result<Self> {
        Self::new(weights)
    }
}

impl From<Weights> for Vec<f64> {
    fn from(weights: Weights) -> Self {
        weights.0
    }
}

/// The weighted daily return series of a whole portfolio.
///
/// Produced once per analysis and never mutated.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(transparent)]
pub struct PortfolioReturns(ReturnSeries);

impl PortfolioReturns {
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        ReturnSeries::new(dates, values).map(Self)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        self.0.dates()
    }

    pub fn values(&self) -> &[f64] {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<ReturnSeries> for PortfolioReturns {
    fn from(series: ReturnSeries) -> Self {
        Self(series)
    }
}

/// The fixed set of metrics produced by the engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    DailyReturn,
    DailyVolatility,
    AnnualReturn,
    AnnualVolatility,
    SharpeRatio,
    SortinoRatio,
    MaximumDrawdown,
    TradingDaysPerYear,
}

impl Metric {
    /// All metrics, in display order.
    pub const ALL: [Metric; 8] = [
        Metric::DailyReturn,
        Metric::DailyVolatility,
        Metric::AnnualReturn,
        Metric::AnnualVolatility,
        Metric::SharpeRatio,
        Metric::SortinoRatio,
        Metric::MaximumDrawdown,
        Metric::TradingDaysPerYear,
    ];

    /// Human-readable metric name.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::DailyReturn => "Daily Return",
            Metric::DailyVolatility => "Daily Volatility",
            Metric::AnnualReturn => "Annual Return",
            Metric::AnnualVolatility => "Annual Volatility",
            Metric::SharpeRatio => "Sharpe Ratio",
            Metric::SortinoRatio => "Sortino Ratio",
            Metric::MaximumDrawdown => "Maximum Drawdown",
            Metric::TradingDaysPerYear => "Trading Days Per Year",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Risk and performance metrics for one portfolio return series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PortfolioMetrics {
    /// Mean daily return
    pub daily_return: f64,
    /// Sample standard deviation of daily returns
    pub daily_volatility: f64,
    /// Daily return scaled by trading days per year
    pub annual_return: f64,
    /// Daily volatility scaled by the square root of trading days per year
    pub annual_volatility: f64,
    /// Excess annual return over annual volatility (`None` when undefined)
    pub sharpe_ratio: Option<f64>,
    /// Excess annual return over annualized downside deviation (`None` when undefined)
    pub sortino_ratio: Option<f64>,
    /// Worst peak-to-trough decline of cumulative growth, as a non-positive fraction
    pub max_drawdown: f64,
    /// Observations per year implied by the sampled date span
    pub trading_days_per_year: f64,
}

impl PortfolioMetrics {
    /// Look up a metric by name. Undefined ratios return `None`.
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::DailyReturn => Some(self.daily_return),
            Metric::DailyVolatility => Some(self.daily_volatility),
            Metric::AnnualReturn => Some(self.annual_return),
            Metric::AnnualVolatility => Some(self.annual_volatility),
            Metric::SharpeRatio => self.sharpe_ratio,
            Metric::SortinoRatio => self.sortino_ratio,
            Metric::MaximumDrawdown => Some(self.max_drawdown),
            Metric::TradingDaysPerYear => Some(self.trading_days_per_year),
        }
    }

    /// Iterate over every metric in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, Option<f64>)> + '_ {
        Metric::ALL.iter().map(move |&m| (m, self.get(m)))
    }
}

/// Lookback window for historical prices.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Lookback {
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[default]
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
}

impl Lookback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lookback::ThreeMonths => "3mo",
            Lookback::SixMonths => "6mo",
            Lookback::OneYear => "1y",
            Lookback::TwoYears => "2y",
            Lookback::FiveYears => "5y",
        }
    }

    /// Length of the window in calendar months.
    pub fn months(&self) -> u32 {
        match self {
            Lookback::ThreeMonths => 3,
            Lookback::SixMonths => 6,
            Lookback::OneYear => 12,
            Lookback::TwoYears => 24,
            Lookback::FiveYears => 60,
        }
    }

    /// First date inside the window ending at `end`.
    pub fn start_from(&self, end: NaiveDate) -> NaiveDate {
        end.checked_sub_months(Months::new(self.months()))
            .unwrap_or(NaiveDate::MIN)
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lookback {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "3mo" => Ok(Lookback::ThreeMonths),
            "6mo" => Ok(Lookback::SixMonths),
            "1y" => Ok(Lookback::OneYear),
            "2y" => Ok(Lookback::TwoYears),
            "5y" => Ok(Lookback::FiveYears),
            other => Err(Error::Config(format!(
                "unknown lookback period '{}', expected one of 3mo, 6mo, 1y, 2y, 5y",
                other
            ))),
        }
    }
}

/// API response wrapper for CLI output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

impl<T> From<Result<T>> for ApiResponse<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e.to_string()),
        }
    }
}

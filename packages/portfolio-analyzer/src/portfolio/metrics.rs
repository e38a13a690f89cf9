//! Portfolio metrics engine.
//!
//! Turns an aligned return matrix and a weight vector into a weighted portfolio
//! return series, then derives annualized return, volatility, Sharpe ratio,
//! Sortino ratio and maximum drawdown from it.

use crate::types::{Metric, PortfolioMetrics, PortfolioReturns, ReturnMatrix, Weights};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default annual risk-free rate (10-year Treasury yield, July 2025).
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.0435;

/// Average calendar days per year, including leap years.
const DAYS_PER_YEAR: f64 = 365.25;

/// What to do when a ratio's denominator is zero or undefined.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UndefinedRatioPolicy {
    /// Record the ratio as undefined (`None`) and keep going.
    #[default]
    Report,
    /// Fail with `Error::UndefinedRatio`.
    Error,
}

/// Stateless calculator for portfolio risk and performance metrics.
///
/// Holds only configuration; every input is passed explicitly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsEngine {
    risk_free_rate: f64,
    undefined_ratio: UndefinedRatioPolicy,
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsEngine {
    /// Create an engine using `DEFAULT_RISK_FREE_RATE` and the `Report` policy.
    pub fn new() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            undefined_ratio: UndefinedRatioPolicy::Report,
        }
    }

    /// Override the annual risk-free rate.
    pub fn with_risk_free_rate(mut self, risk_free_rate: f64) -> Self {
        self.risk_free_rate = risk_free_rate;
        self
    }

    /// Override the undefined ratio policy.
    pub fn with_undefined_ratio_policy(mut self, policy: UndefinedRatioPolicy) -> Self {
        self.undefined_ratio = policy;
        self
    }

    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    pub fn undefined_ratio_policy(&self) -> UndefinedRatioPolicy {
        self.undefined_ratio
    }

    /// Weighted sum of asset returns for each date.
    ///
    /// See [`compute_portfolio_returns`].
    pub fn compute_portfolio_returns(
        &self,
        matrix: &ReturnMatrix,
        weights: &Weights,
    ) -> Result<PortfolioReturns> {
        compute_portfolio_returns(matrix, weights)
    }

    /// Calculate all metrics for a portfolio return series.
    ///
    /// # Arguments
    ///
    /// * `returns` - Dated daily portfolio returns, at least 2 observations
    ///
    /// # Returns
    ///
    /// `PortfolioMetrics`, or an error if there are fewer than 2 observations,
    /// the dates span zero days, or a ratio is undefined under
    /// `UndefinedRatioPolicy::Error`.
    pub fn compute_metrics(&self, returns: &PortfolioReturns) -> Result<PortfolioMetrics> {
        let values = returns.values();
        if values.len() < 2 {
            return Err(Error::InsufficientData(format!(
                "need at least 2 return observations, got {}",
                values.len()
            )));
        }

        let trading_days_per_year = trading_days_per_year(returns.dates())?;

        let daily_return = mean(values);
        let daily_volatility = sample_std_dev(values).ok_or_else(|| {
            Error::InsufficientData("volatility needs at least 2 observations".to_string())
        })?;

        let annual_return = daily_return * trading_days_per_year;
        let annual_volatility = daily_volatility * trading_days_per_year.sqrt();
        let excess_return = annual_return - self.risk_free_rate;

        let sharpe_ratio = self.ratio(Metric::SharpeRatio, excess_return, Some(annual_volatility))?;

        let downside = downside_deviation(values, trading_days_per_year);
        let sortino_ratio = self.ratio(Metric::SortinoRatio, excess_return, downside)?;

        let max_drawdown = max_drawdown(values);

        debug!(
            observations = values.len(),
            trading_days_per_year,
            annual_return,
            annual_volatility,
            downside_deviation = ?downside,
            max_drawdown,
            "computed portfolio metrics"
        );

        Ok(PortfolioMetrics {
            daily_return,
            daily_volatility,
            annual_return,
            annual_volatility,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            trading_days_per_year,
        })
    }

    /// Divide excess return by a risk denominator, applying the undefined ratio policy.
    fn ratio(&self, metric: Metric, excess_return: f64, denominator: Option<f64>) -> Result<Option<f64>> {
        match denominator.filter(|d| d.is_finite() && *d > f64::EPSILON) {
            Some(d) => Ok(Some(excess_return / d)),
            None => match self.undefined_ratio {
                UndefinedRatioPolicy::Report => {
                    debug!(%metric, ?denominator, "ratio undefined");
                    Ok(None)
                }
                UndefinedRatioPolicy::Error => Err(Error::UndefinedRatio(metric)),
            },
        }
    }
}

/// Compute the weighted portfolio return for each date.
///
/// Each value is `sum_i(weights[i] * matrix[t][i])`. Weights are used as given;
/// weights that do not sum to 1.0 scale the result proportionally.
///
/// # Errors
///
/// `Error::Data` if the matrix has no rows or no columns, or if the number of
/// weights differs from the number of assets.
pub fn compute_portfolio_returns(matrix: &ReturnMatrix, weights: &Weights) -> Result<PortfolioReturns> {
    if matrix.row_count() == 0 {
        return Err(Error::Data("return matrix has no rows".to_string()));
    }
    if matrix.asset_count() == 0 {
        return Err(Error::Data("return matrix has no asset columns".to_string()));
    }
    if weights.len() != matrix.asset_count() {
        return Err(Error::Data(format!(
            "weight vector has {} entries but return matrix has {} assets",
            weights.len(),
            matrix.asset_count()
        )));
    }

    let values = matrix
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .zip(weights.as_slice())
                .map(|(r, w)| w * r)
                .sum::<f64>()
        })
        .collect();

    PortfolioReturns::new(matrix.dates().to_vec(), values)
}

/// Estimate observations per year from the sampled date span.
///
/// `count / ((last - first) in days / 365.25)`. Adapts annualization to the
/// actual sampling density instead of assuming 252.
pub fn trading_days_per_year(dates: &[NaiveDate]) -> Result<f64> {
    let (first, last) = match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(Error::Data("return series has no dates".to_string())),
    };

    let elapsed_days = (last - first).num_days();
    if elapsed_days <= 0 {
        return Err(Error::Data(format!(
            "return series spans zero days ({} to {})",
            first, last
        )));
    }

    let years = elapsed_days as f64 / DAYS_PER_YEAR;
    Ok(dates.len() as f64 / years)
}

/// Arithmetic mean. Zero for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (N-1 denominator). `None` with fewer than 2 values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Annualized sample standard deviation of the strictly negative returns.
///
/// `None` when fewer than 2 returns are negative, since the sample deviation is
/// undefined there.
pub fn downside_deviation(values: &[f64], periods_per_year: f64) -> Option<f64> {
    let negatives: Vec<f64> = values.iter().copied().filter(|&r| r < 0.0).collect();
    sample_std_dev(&negatives).map(|std| std * periods_per_year.sqrt())
}

/// Maximum drawdown of the cumulative growth series.
///
/// Returns the most negative `(cum - peak) / peak`, e.g. -0.15 for a 15% decline.
/// Zero when the cumulative series never falls below its running peak.
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut cumulative = 1.0;
    let mut running_max = f64::NEG_INFINITY;
    let mut max_drawdown = 0.0_f64;

    for r in values {
        cumulative *= 1.0 + r;
        if cumulative > running_max {
            running_max = cumulative;
        }
        let drawdown = (cumulative - running_max) / running_max;
        if drawdown < max_drawdown {
            max_drawdown = drawdown;
        }
    }

    max_drawdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use chrono::Days;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    /// Consecutive calendar dates starting at 2024-01-02.
    fn daily_dates(n: usize) -> Vec<NaiveDate> {
        (0..n as u64).map(|i| start() + Days::new(i)).collect()
    }

    fn portfolio(values: &[f64]) -> PortfolioReturns {
        PortfolioReturns::new(daily_dates(values.len()), values.to_vec()).unwrap()
    }

    fn single_asset(values: &[f64]) -> ReturnMatrix {
        ReturnMatrix::new(
            daily_dates(values.len()),
            vec!["SPY".into()],
            values.iter().map(|v| vec![*v]).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_portfolio_returns_exact_arithmetic() {
        let matrix = ReturnMatrix::new(
            daily_dates(3),
            vec!["A".into(), "B".into(), "C".into()],
            vec![
                vec![0.01, 0.02, 0.0],
                vec![-0.01, 0.0, 0.01],
                vec![0.03, -0.02, 0.005],
            ],
        )
        .unwrap();
        let weights = Weights::new(vec![0.5, 0.3, 0.2]).unwrap();

        let returns = compute_portfolio_returns(&matrix, &weights).unwrap();

        assert_eq!(returns.len(), 3);
        assert_eq!(returns.values()[0], 0.5 * 0.01 + 0.3 * 0.02 + 0.2 * 0.0);
        assert_eq!(returns.values()[1], 0.5 * -0.01 + 0.3 * 0.0 + 0.2 * 0.01);
        assert_eq!(returns.values()[2], 0.5 * 0.03 + 0.3 * -0.02 + 0.2 * 0.005);
        assert_abs_diff_eq!(returns.values()[0], 0.011, epsilon = 1e-15);
        assert_eq!(returns.dates(), matrix.dates());
    }

    #[test]
    fn test_identical_assets_invariant_under_equal_weights() {
        let constant = 0.0007;
        let matrix = ReturnMatrix::new(
            daily_dates(5),
            vec!["A".into(), "B".into(), "C".into(), "D".into()],
            vec![vec![constant; 4]; 5],
        )
        .unwrap();

        let returns = compute_portfolio_returns(&matrix, &Weights::equal(4)).unwrap();

        for value in returns.values() {
            assert_relative_eq!(*value, constant, max_relative = 1e-15);
        }
    }

    #[test]
    fn test_portfolio_returns_dimension_errors() {
        let matrix = single_asset(&[0.01, 0.02]);
        let weights = Weights::new(vec![0.5, 0.5]).unwrap();
        assert!(matches!(
            compute_portfolio_returns(&matrix, &weights),
            Err(Error::Data(_))
        ));

        let empty_rows = ReturnMatrix::new(vec![], vec!["A".into()], vec![]).unwrap();
        assert!(matches!(
            compute_portfolio_returns(&empty_rows, &Weights::equal(1)),
            Err(Error::Data(_))
        ));

        let no_columns = ReturnMatrix::new(daily_dates(2), vec![], vec![vec![], vec![]]).unwrap();
        assert!(matches!(
            compute_portfolio_returns(&no_columns, &Weights::equal(0)),
            Err(Error::Data(_))
        ));
    }

    #[test]
    fn test_two_point_series() {
        let metrics = MetricsEngine::new()
            .compute_metrics(&portfolio(&[0.01, -0.01]))
            .unwrap();

        assert_abs_diff_eq!(metrics.daily_return, 0.0, epsilon = 1e-12);
        assert!(metrics.max_drawdown <= 0.0);
        // 1.01 * 0.99 = 0.9999, down from 1.01
        assert_abs_diff_eq!(metrics.max_drawdown, -0.01, epsilon = 1e-12);
        // Only one negative return: downside deviation is undefined
        assert_eq!(metrics.sortino_ratio, None);
        assert!(metrics.sharpe_ratio.is_some());
    }

    #[test]
    fn test_insufficient_data() {
        let engine = MetricsEngine::new();
        assert!(matches!(
            engine.compute_metrics(&portfolio(&[0.01])),
            Err(Error::InsufficientData(_))
        ));
        assert!(matches!(
            engine.compute_metrics(&portfolio(&[])),
            Err(Error::InsufficientData(_))
        ));
    }

    #[test]
    fn test_zero_time_span() {
        assert!(matches!(trading_days_per_year(&[start(), start()]), Err(Error::Data(_))));

        // A same-day series cannot be built in the first place
        let same_day = PortfolioReturns::new(vec![start(), start()], vec![0.01, -0.01]);
        assert!(matches!(same_day, Err(Error::Data(_))));
    }

    #[test]
    fn test_non_finite_returns_rejected() {
        let returns = PortfolioReturns::new(daily_dates(4), vec![-0.10, f64::NAN, -0.2, 0.01]);
        assert!(matches!(returns, Err(Error::Data(_))));

        let matrix = ReturnMatrix::new(
            daily_dates(3),
            vec!["SPY".into()],
            vec![vec![0.01], vec![f64::NEG_INFINITY], vec![0.02]],
        );
        assert!(matches!(matrix, Err(Error::Data(_))));
    }

    #[test]
    fn test_trading_days_per_year_daily_sampling() {
        // 252 observations spread over exactly 365 calendar days
        let dates: Vec<NaiveDate> = (0..252u64)
            .map(|i| start() + Days::new((i * 365 + 125) / 251))
            .collect();
        assert_eq!((*dates.last().unwrap() - dates[0]).num_days(), 365);

        let returns = PortfolioReturns::new(dates, vec![0.0005; 252]).unwrap();
        let metrics = MetricsEngine::new().compute_metrics(&returns).unwrap();

        assert_relative_eq!(metrics.trading_days_per_year, 252.0, max_relative = 0.01);
        assert_relative_eq!(metrics.daily_return, 0.0005, max_relative = 1e-12);
        assert_relative_eq!(
            metrics.annual_return,
            0.0005 * metrics.trading_days_per_year,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_annualization() {
        let values = [0.01, -0.005, 0.008, -0.003, 0.012, -0.007, 0.005, 0.002];
        let returns = portfolio(&values);
        let metrics = MetricsEngine::new().compute_metrics(&returns).unwrap();

        // 8 observations over 7 days
        let tdpy = 8.0 / (7.0 / 365.25);
        assert_relative_eq!(metrics.trading_days_per_year, tdpy, max_relative = 1e-12);
        assert_relative_eq!(metrics.daily_return, mean(&values), max_relative = 1e-12);
        assert_relative_eq!(metrics.annual_return, metrics.daily_return * tdpy, max_relative = 1e-12);
        assert_relative_eq!(
            metrics.annual_volatility,
            metrics.daily_volatility * tdpy.sqrt(),
            max_relative = 1e-12
        );
        assert_relative_eq!(
            metrics.sharpe_ratio.unwrap(),
            (metrics.annual_return - DEFAULT_RISK_FREE_RATE) / metrics.annual_volatility,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_sample_std_dev() {
        // Known sample std of [2, 4, 4, 4, 5, 5, 7, 9] is sqrt(32 / 7)
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(
            sample_std_dev(&values).unwrap(),
            (32.0_f64 / 7.0).sqrt(),
            max_relative = 1e-12
        );
        assert_eq!(sample_std_dev(&[1.0]), None);
    }

    #[test]
    fn test_max_drawdown() {
        // Series that goes up, then down significantly
        let returns = vec![0.10, 0.05, -0.15, -0.10, 0.05];

        let mdd = max_drawdown(&returns);

        // Peak: 1.10 * 1.05 = 1.155; trough: 1.155 * 0.85 * 0.90
        // Drawdown: 0.85 * 0.90 - 1 = -0.235
        assert_abs_diff_eq!(mdd, -0.235, epsilon = 1e-12);
    }

    #[test]
    fn test_max_drawdown_no_loss() {
        let returns = vec![0.01, 0.02, 0.03, 0.01, 0.02];
        assert_eq!(max_drawdown(&returns), 0.0);
    }

    #[test]
    fn test_max_drawdown_first_day_is_initial_peak() {
        // The running peak starts at the first cumulative value, not at 1.0
        assert_eq!(max_drawdown(&[-0.05, 0.01]), 0.0);
        assert_abs_diff_eq!(max_drawdown(&[-0.05, -0.10]), -0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_max_drawdown_never_positive() {
        let series: [&[f64]; 4] = [
            &[0.02, -0.01, 0.03, -0.04, 0.01],
            &[-0.5, 0.9, -0.3],
            &[0.001; 10],
            &[],
        ];
        for values in series {
            assert!(max_drawdown(values) <= 0.0);
        }
    }

    #[test]
    fn test_weight_scaling() {
        let asset = [0.012, -0.004, 0.007, -0.009, 0.003, 0.010, -0.002];
        let matrix = single_asset(&asset);
        let engine = MetricsEngine::new();

        let base = engine
            .compute_metrics(&compute_portfolio_returns(&matrix, &Weights::equal(1)).unwrap())
            .unwrap();
        let doubled = engine
            .compute_metrics(&compute_portfolio_returns(&matrix, &Weights::equal(1).scaled(2.0)).unwrap())
            .unwrap();

        assert_relative_eq!(doubled.daily_return, 2.0 * base.daily_return, max_relative = 1e-12);
        assert_relative_eq!(doubled.annual_return, 2.0 * base.annual_return, max_relative = 1e-12);
        assert_relative_eq!(
            doubled.annual_volatility,
            2.0 * base.annual_volatility,
            max_relative = 1e-12
        );

        // With a non-zero risk-free rate the Sharpe ratio is not scale invariant
        assert!((doubled.sharpe_ratio.unwrap() - base.sharpe_ratio.unwrap()).abs() > 1e-6);

        // With a zero risk-free rate both ratios are
        let engine = MetricsEngine::new().with_risk_free_rate(0.0);
        let base = engine
            .compute_metrics(&compute_portfolio_returns(&matrix, &Weights::equal(1)).unwrap())
            .unwrap();
        let doubled = engine
            .compute_metrics(&compute_portfolio_returns(&matrix, &Weights::equal(1).scaled(2.0)).unwrap())
            .unwrap();
        assert_relative_eq!(
            doubled.sharpe_ratio.unwrap(),
            base.sharpe_ratio.unwrap(),
            max_relative = 1e-12
        );
        assert_relative_eq!(
            doubled.sortino_ratio.unwrap(),
            base.sortino_ratio.unwrap(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_sortino_exceeds_sharpe_with_small_downside() {
        let values = [0.02, -0.01, 0.03, -0.005, 0.015, 0.01, -0.002, 0.025];
        let metrics = MetricsEngine::new().compute_metrics(&portfolio(&values)).unwrap();

        let downside = downside_deviation(&values, metrics.trading_days_per_year).unwrap();
        assert!(downside < metrics.annual_volatility);
        assert!(metrics.annual_return > DEFAULT_RISK_FREE_RATE);
        assert!(metrics.sortino_ratio.unwrap() >= metrics.sharpe_ratio.unwrap());
    }

    #[test]
    fn test_downside_deviation_uses_only_negative_returns() {
        let values = [0.05, -0.01, 0.02, -0.03];
        let expected = sample_std_dev(&[-0.01, -0.03]).unwrap() * 4.0_f64.sqrt();
        assert_relative_eq!(
            downside_deviation(&values, 4.0).unwrap(),
            expected,
            max_relative = 1e-12
        );
        assert_eq!(downside_deviation(&[0.01, 0.02], 252.0), None);
    }

    #[test]
    fn test_constant_returns_undefined_ratios() {
        let returns = portfolio(&[0.001; 10]);

        let metrics = MetricsEngine::new().compute_metrics(&returns).unwrap();
        assert_eq!(metrics.sharpe_ratio, None);
        assert_eq!(metrics.sortino_ratio, None);
        assert!(metrics.daily_volatility.abs() < 1e-15);

        let strict = MetricsEngine::new().with_undefined_ratio_policy(UndefinedRatioPolicy::Error);
        assert!(matches!(
            strict.compute_metrics(&returns),
            Err(Error::UndefinedRatio(Metric::SharpeRatio))
        ));
    }

    #[test]
    fn test_strict_policy_no_negative_returns() {
        let returns = portfolio(&[0.01, 0.02, 0.005, 0.015]);
        let strict = MetricsEngine::new().with_undefined_ratio_policy(UndefinedRatioPolicy::Error);

        assert!(matches!(
            strict.compute_metrics(&returns),
            Err(Error::UndefinedRatio(Metric::SortinoRatio))
        ));
    }

    #[test]
    fn test_risk_free_rate_override() {
        let values = [0.01, -0.005, 0.008, -0.003, 0.012];
        let returns = portfolio(&values);

        let default = MetricsEngine::new().compute_metrics(&returns).unwrap();
        let zero_rf = MetricsEngine::new()
            .with_risk_free_rate(0.0)
            .compute_metrics(&returns)
            .unwrap();

        assert_eq!(MetricsEngine::new().risk_free_rate(), 0.0435);
        assert_relative_eq!(
            zero_rf.sharpe_ratio.unwrap() - default.sharpe_ratio.unwrap(),
            DEFAULT_RISK_FREE_RATE / default.annual_volatility,
            max_relative = 1e-9
        );
    }
}

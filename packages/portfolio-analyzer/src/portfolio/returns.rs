//! Daily return derivation and alignment.

use crate::types::{PricePoint, ReturnMatrix, ReturnSeries};
use crate::{Error, Result};

/// Calculate daily percentage returns from a price series.
///
/// `return[t] = (price[t] - price[t-1]) / price[t-1]`. The first date has no
/// defined return and is dropped, so `n` prices give `n - 1` returns.
///
/// # Errors
///
/// `Error::Data` if the prices are unsorted, repeat a date, or produce a
/// non-finite return (a zero or non-finite previous price).
pub fn pct_change(prices: &[PricePoint]) -> Result<ReturnSeries> {
    let mut dates = Vec::with_capacity(prices.len().saturating_sub(1));
    let mut values = Vec::with_capacity(prices.len().saturating_sub(1));

    for window in prices.windows(2) {
        let (prev, curr) = (window[0], window[1]);
        if prev.close == 0.0 {
            return Err(Error::Data(format!(
                "price on {} is zero, return for {} is undefined",
                prev.date, curr.date
            )));
        }
        dates.push(curr.date);
        values.push((curr.close - prev.close) / prev.close);
    }

    ReturnSeries::new(dates, values)
}

/// Align per-asset return series into a single matrix.
///
/// Every series must share the exact same date index. Missing or extra dates
/// are reported as an error rather than filled.
///
/// # Arguments
///
/// * `columns` - `(symbol, returns)` pairs, in asset order
pub fn align_returns(columns: &[(String, ReturnSeries)]) -> Result<ReturnMatrix> {
    let (first_symbol, first) = columns
        .first()
        .ok_or_else(|| Error::Data("no return series to align".to_string()))?;

    for (symbol, series) in &columns[1..] {
        if series.dates() == first.dates() {
            continue;
        }

        let mismatch = series
            .dates()
            .iter()
            .zip(first.dates())
            .find(|(a, b)| a != b)
            .map(|(a, b)| format!("{} has {} where {} has {}", symbol, a, first_symbol, b))
            .unwrap_or_else(|| {
                format!(
                    "{} has {} dates where {} has {}",
                    symbol,
                    series.len(),
                    first_symbol,
                    first.len()
                )
            });

        return Err(Error::Data(format!("return series are not aligned: {}", mismatch)));
    }

    let symbols: Vec<String> = columns.iter().map(|(symbol, _)| symbol.clone()).collect();
    let rows: Vec<Vec<f64>> = (0..first.len())
        .map(|t| columns.iter().map(|(_, series)| series.values()[t]).collect())
        .collect();

    ReturnMatrix::new(first.dates().to_vec(), symbols, rows)
}

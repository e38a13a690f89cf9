//! Price data sources.
//!
//! The metrics engine never talks to a data provider directly. A `PriceSource`
//! supplies prices and per-symbol returns, and [`load_return_matrix`] joins them
//! into an aligned `ReturnMatrix`.

mod memory;

pub use memory::InMemoryPriceSource;

use crate::portfolio::align_returns;
use crate::types::{Lookback, PricePoint, ReturnMatrix, ReturnSeries};
use crate::Result;
use std::collections::BTreeMap;
use tracing::debug;

/// Daily close prices keyed by symbol.
pub type PriceTable = BTreeMap<String, Vec<PricePoint>>;

/// A provider of historical daily prices.
pub trait PriceSource {
    /// Fetch daily close prices for `tickers` over the `period` window.
    ///
    /// Fetched prices are retained so that [`PriceSource::returns_for`] can
    /// derive returns from them.
    ///
    /// # Errors
    ///
    /// `Error::SymbolNotFound` if any ticker is unknown.
    fn fetch(&mut self, tickers: &[String], period: Lookback) -> Result<PriceTable>;

    /// Daily returns for a previously fetched symbol.
    ///
    /// # Errors
    ///
    /// `Error::SymbolNotFound` if the symbol was never fetched.
    fn returns_for(&self, symbol: &str) -> Result<ReturnSeries>;
}

/// Fetch `tickers`, derive their returns, and align them into a matrix.
///
/// Columns follow the order of `tickers`.
pub fn load_return_matrix<S: PriceSource + ?Sized>(
    source: &mut S,
    tickers: &[String],
    period: Lookback,
) -> Result<ReturnMatrix> {
    let prices = source.fetch(tickers, period)?;
    debug!(
        symbols = prices.len(),
        period = %period,
        "fetched price history"
    );

    let columns = tickers
        .iter()
        .map(|ticker| Ok((ticker.clone(), source.returns_for(ticker)?)))
        .collect::<Result<Vec<_>>>()?;

    align_returns(&columns)
}

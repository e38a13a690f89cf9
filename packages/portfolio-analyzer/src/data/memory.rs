//! In-memory price source backed by a JSON price file.

use super::{PriceSource, PriceTable};
use crate::portfolio::pct_change;
use crate::types::{Lookback, PricePoint, ReturnSeries};
use crate::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Price source holding full price histories in memory.
///
/// Symbols are stored upper-cased, so lookups are case-insensitive.
///
/// JSON layout:
///
/// ```json
/// {
///   "AAPL": [{"date": "2024-01-02", "close": 185.64}, {"date": "2024-01-03", "close": 184.25}],
///   "MSFT": [{"date": "2024-01-02", "close": 370.87}, {"date": "2024-01-03", "close": 370.60}]
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceSource {
    /// Full price history per symbol, sorted by date
    history: PriceTable,
    /// Prices returned by the last `fetch`, per symbol
    fetched: PriceTable,
}

impl InMemoryPriceSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source from a table of price histories.
    pub fn from_table(table: PriceTable) -> Result<Self> {
        let mut source = Self::new();
        for (symbol, prices) in table {
            source.insert(&symbol, prices)?;
        }
        Ok(source)
    }

    /// Load price histories from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parse price histories from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let table: PriceTable = serde_json::from_str(json)?;
        Self::from_table(table)
    }

    /// Add or replace the price history for a symbol.
    ///
    /// Prices are sorted by date. Duplicate dates and non-positive or
    /// non-finite prices are rejected.
    pub fn insert(&mut self, symbol: &str, mut prices: Vec<PricePoint>) -> Result<()> {
        let symbol = symbol.trim().to_uppercase();

        if let Some(p) = prices.iter().find(|p| !p.close.is_finite() || p.close <= 0.0) {
            return Err(Error::Data(format!(
                "{} has invalid close price {} on {}",
                symbol, p.close, p.date
            )));
        }

        prices.sort_by_key(|p| p.date);
        if let Some(pair) = prices.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(Error::Data(format!(
                "{} has more than one price on {}",
                symbol, pair[0].date
            )));
        }

        self.fetched.remove(&symbol);
        self.history.insert(symbol, prices);
        Ok(())
    }

    /// Symbols with a price history.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.history.keys().map(String::as_str)
    }

    /// Whether a symbol has a price history.
    pub fn contains(&self, symbol: &str) -> bool {
        self.history.contains_key(&symbol.trim().to_uppercase())
    }
}

impl PriceSource for InMemoryPriceSource {
    /// The window ends at the latest date found across the requested tickers.
    fn fetch(&mut self, tickers: &[String], period: Lookback) -> Result<PriceTable> {
        let symbols: Vec<String> = tickers.iter().map(|t| t.trim().to_uppercase()).collect();

        let histories = symbols
            .iter()
            .map(|symbol| {
                self.history
                    .get(symbol)
                    .map(|prices| (symbol, prices))
                    .ok_or_else(|| Error::SymbolNotFound(symbol.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        let latest = histories
            .iter()
            .filter_map(|(_, prices)| prices.last().map(|p| p.date))
            .max();

        let mut table = PriceTable::new();
        if let Some(end) = latest {
            let start = period.start_from(end);
            debug!(%start, %end, %period, "price window");

            for (symbol, prices) in histories {
                let window: Vec<PricePoint> = prices
                    .iter()
                    .filter(|p| p.date >= start && p.date <= end)
                    .copied()
                    .collect();
                table.insert(symbol.clone(), window);
            }
        }

        self.fetched.extend(table.clone());
        Ok(table)
    }

    fn returns_for(&self, symbol: &str) -> Result<ReturnSeries> {
        let symbol = symbol.trim().to_uppercase();
        let prices = self
            .fetched
            .get(&symbol)
            .ok_or_else(|| Error::SymbolNotFound(symbol.clone()))?;
        pct_change(prices)
    }
}

//! OHLCV candles and the ordered datasets built from them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FutureCoinError;
use crate::market::{Currency, IntervalClass, Symbol};

/// One OHLCV observation for a symbol over an interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    /// Start of the interval.
    pub ts: DateTime<Utc>,
    /// Opening price.
    pub open: Decimal,
    /// Highest traded price.
    pub high: Decimal,
    /// Lowest traded price.
    pub low: Decimal,
    /// Closing price.
    pub close: Decimal,
    /// Traded base-asset volume.
    pub volume: Decimal,
    /// Asset the candle belongs to.
    pub symbol: Symbol,
    /// Currency the prices are quoted in.
    pub currency: Currency,
}

impl Candle {
    /// Check the OHLCV invariants.
    ///
    /// Prices and volume must be non-negative, `low <= high`, and both `open`
    /// and `close` must lie within `[low, high]`.
    ///
    /// # Errors
    /// Returns `DataIntegrity` describing the first violated invariant.
    pub fn validate(&self) -> Result<(), FutureCoinError> {
        let fail = |what: &str| {
            Err(FutureCoinError::DataIntegrity(format!(
                "{} candle at {}: {what}",
                self.symbol,
                self.ts.to_rfc3339()
            )))
        };
        if [self.open, self.high, self.low, self.close]
            .iter()
            .any(|p| *p < Decimal::ZERO)
        {
            return fail("negative price");
        }
        if self.volume < Decimal::ZERO {
            return fail("negative volume");
        }
        if self.low > self.high {
            return fail("low above high");
        }
        if self.open < self.low || self.open > self.high {
            return fail("open outside [low, high]");
        }
        if self.close < self.low || self.close > self.high {
            return fail("close outside [low, high]");
        }
        Ok(())
    }
}

/// Ordered candles for one symbol, interval class and currency.
///
/// Construction sorts by timestamp and keeps only the first candle for each
/// timestamp, so a dataset never holds duplicate `(timestamp, symbol)` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    symbol: Symbol,
    interval: IntervalClass,
    currency: Currency,
    candles: Vec<Candle>,
}

impl Dataset {
    /// Build a dataset, discarding candles whose symbol or currency disagree
    /// with the header and collapsing duplicate timestamps (first wins).
    #[must_use]
    pub fn new(
        symbol: Symbol,
        interval: IntervalClass,
        currency: Currency,
        mut candles: Vec<Candle>,
    ) -> Self {
        candles.retain(|c| c.symbol == symbol && c.currency == currency);
        candles.sort_by_key(|c| c.ts);
        candles.dedup_by_key(|c| c.ts);
        Self {
            symbol,
            interval,
            currency,
            candles,
        }
    }

    /// Empty dataset with the given header.
    #[must_use]
    pub const fn empty(symbol: Symbol, interval: IntervalClass, currency: Currency) -> Self {
        Self {
            symbol,
            interval,
            currency,
            candles: Vec::new(),
        }
    }

    /// Asset symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Interval class of every candle.
    #[must_use]
    pub const fn interval(&self) -> IntervalClass {
        self.interval
    }

    /// Quote currency of every candle.
    #[must_use]
    pub const fn currency(&self) -> Currency {
        self.currency
    }

    /// Read-only view of the candles, oldest first.
    #[must_use]
    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// Number of candles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// True when the dataset has no candles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Most recent candle.
    #[must_use]
    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// The `n` most recent candles (or all of them when fewer exist).
    #[must_use]
    pub fn tail(&self, n: usize) -> &[Candle] {
        let start = self.candles.len().saturating_sub(n);
        &self.candles[start..]
    }

    /// Closing prices, oldest first.
    #[must_use]
    pub fn closes(&self) -> Vec<Decimal> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// Consume the dataset and return its candles.
    #[must_use]
    pub fn into_candles(self) -> Vec<Candle> {
        self.candles
    }
}

/// Several datasets combined into one table sorted by `(timestamp, symbol)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedDataset {
    interval: IntervalClass,
    rows: Vec<Candle>,
}

impl MergedDataset {
    /// Build a merged table; for duplicate `(timestamp, symbol)` pairs the
    /// first row in input order is kept.
    #[must_use]
    pub fn new(interval: IntervalClass, mut rows: Vec<Candle>) -> Self {
        rows.sort_by(|a, b| a.ts.cmp(&b.ts).then_with(|| a.symbol.cmp(&b.symbol)));
        rows.dedup_by(|a, b| a.ts == b.ts && a.symbol == b.symbol);
        Self { interval, rows }
    }

    /// Interval class shared by every row.
    #[must_use]
    pub const fn interval(&self) -> IntervalClass {
        self.interval
    }

    /// Read-only view of the rows.
    #[must_use]
    pub fn rows(&self) -> &[Candle] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no rows are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct symbols in ascending order.
    #[must_use]
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut out: Vec<Symbol> = self.rows.iter().map(|r| r.symbol.clone()).collect();
        out.sort();
        out.dedup();
        out
    }
}

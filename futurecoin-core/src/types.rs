//! Request and response shapes exchanged with connectors, plus re-exports of
//! the shared domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use futurecoin_types::*;

/// Parameters for a history fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryRequest {
    /// Candle granularity.
    pub interval: IntervalClass,
    /// Number of most recent candles wanted.
    pub lookback: u32,
    /// Exclusive upper bound on candle timestamps; `None` means "now".
    pub end: Option<DateTime<Utc>>,
}

impl HistoryRequest {
    /// Build a request for the latest `lookback` candles.
    ///
    /// # Errors
    /// Returns `InvalidArg` when `lookback` is zero.
    pub fn new(interval: IntervalClass, lookback: u32) -> Result<Self, FutureCoinError> {
        if lookback == 0 {
            return Err(FutureCoinError::InvalidArg(
                "lookback must be at least one candle".into(),
            ));
        }
        Ok(Self {
            interval,
            lookback,
            end: None,
        })
    }

    /// Bound the window to candles strictly before `end`.
    #[must_use]
    pub const fn ending_at(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    /// Start of the requested window given an effective end instant.
    #[must_use]
    pub fn window_start(&self, end: DateTime<Utc>) -> DateTime<Utc> {
        end - chrono::Duration::seconds(self.interval.seconds() * i64::from(self.lookback))
    }
}

/// Parameters for an exchange-rate fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateRequest {
    /// Currency converted from.
    pub base: Currency,
    /// Currency converted to.
    pub quote: Currency,
    /// Number of calendar days of history wanted, ending today.
    pub days: u32,
}

/// Latest traded price for an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotPrice {
    /// Asset priced.
    pub symbol: Symbol,
    /// Last traded price.
    pub price: Decimal,
    /// Quote currency of `price`.
    pub currency: Currency,
    /// When the provider observed the price.
    pub as_of: DateTime<Utc>,
}

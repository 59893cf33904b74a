//! Historical exchange-rate samples and the lookup table built from them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::market::Currency;

/// One daily conversion rate from the table's base currency to its quote currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRateSample {
    /// Calendar day (UTC) the rate applies to.
    pub date: NaiveDate,
    /// Units of quote currency per one unit of base currency.
    pub rate: Decimal,
}

/// Date-ordered exchange rates for one currency pair.
///
/// Samples are kept sorted and unique per date; non-positive rates are
/// discarded on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    base: Currency,
    quote: Currency,
    samples: Vec<ExchangeRateSample>,
}

impl RateTable {
    /// Build a table; for duplicate dates the first sample wins.
    #[must_use]
    pub fn new(base: Currency, quote: Currency, mut samples: Vec<ExchangeRateSample>) -> Self {
        samples.retain(|s| s.rate > Decimal::ZERO);
        samples.sort_by_key(|s| s.date);
        samples.dedup_by_key(|s| s.date);
        Self {
            base,
            quote,
            samples,
        }
    }

    /// Currency converted from.
    #[must_use]
    pub const fn base(&self) -> Currency {
        self.base
    }

    /// Currency converted to.
    #[must_use]
    pub const fn quote(&self) -> Currency {
        self.quote
    }

    /// Samples in ascending date order.
    #[must_use]
    pub fn samples(&self) -> &[ExchangeRateSample] {
        &self.samples
    }

    /// True when the table holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Rate of the nearest sample dated on or before `date`.
    #[must_use]
    pub fn rate_on(&self, date: NaiveDate) -> Option<Decimal> {
        let idx = self.samples.partition_point(|s| s.date <= date);
        idx.checked_sub(1).map(|i| self.samples[i].rate)
    }

    /// Most recent sample.
    #[must_use]
    pub fn latest(&self) -> Option<ExchangeRateSample> {
        self.samples.last().copied()
    }
}

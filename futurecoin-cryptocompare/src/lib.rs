//! futurecoin-cryptocompare
//!
//! Public connector that implements `FutureCoinConnector` on top of the
//! CryptoCompare min-api. Serves daily and hourly USD history, paging past
//! the per-call row limit, plus aggregated spot prices. An API key is
//! optional; anonymous calls share a lower rate limit.
#![warn(missing_docs)]

/// Adapter definitions and the production adapter backed by `reqwest`.
pub mod adapter;
mod builder;

use std::sync::Arc;

use adapter::CryptoCompareApi;
use adapter::{HistoKind, HistoRow, MAX_ROWS_PER_CALL, RealAdapter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futurecoin_core::{
    Candle, Currency, Dataset, FutureCoinError, HistoryRequest, IntervalClass, SpotPrice, Symbol,
    connector::{ConnectorKey, FutureCoinConnector, HistoryProvider, QuoteProvider},
};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

pub use builder::CryptoCompareConnectorBuilder;

#[cfg(feature = "test-adapters")]
type ApiAdapter = Arc<dyn CryptoCompareApi>;
#[cfg(not(feature = "test-adapters"))]
type ApiAdapter = Arc<RealAdapter>;

const INTERVALS: &[IntervalClass] = &[IntervalClass::Daily, IntervalClass::Hourly];
const MAX_LOOKBACK: u32 = 10_000;
const QUOTE_CCY: &str = "USD";

/// Public connector type. Production users will construct with `CryptoCompareConnector::new_default()`.
pub struct CryptoCompareConnector {
    api: ApiAdapter,
}

impl CryptoCompareConnector {
    /// Static connector key for orchestrator priority configuration.
    pub const KEY: ConnectorKey = ConnectorKey::new("futurecoin-cryptocompare");

    fn looks_like_not_found(msg: &str) -> bool {
        let m = msg.to_ascii_lowercase();
        m.contains("does not exist") || m.contains("not found") || m.contains("no data")
    }

    fn normalize_error(e: FutureCoinError, what: &str) -> FutureCoinError {
        match e {
            FutureCoinError::Connector { connector: _, msg } => {
                if Self::looks_like_not_found(&msg) {
                    FutureCoinError::not_found(what.to_string())
                } else {
                    FutureCoinError::connector(Self::KEY.as_str(), msg)
                }
            }
            FutureCoinError::Other(msg) => FutureCoinError::connector(Self::KEY.as_str(), msg),
            other => other,
        }
    }

    /// Anonymous connector against the public endpoint.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new_default() -> Result<Self, FutureCoinError> {
        Ok(Self::new_with_adapter(RealAdapter::new_default()?))
    }

    /// Connector against a custom endpoint root, optionally authenticated.
    ///
    /// # Errors
    /// Returns `Config` for an invalid URL.
    pub fn with_base_url(base_url: &str, api_key: Option<String>) -> Result<Self, FutureCoinError> {
        Ok(Self::new_with_adapter(RealAdapter::with_base_url(
            base_url, api_key,
        )?))
    }

    /// Build from a configured production adapter.
    #[must_use]
    pub fn new_with_adapter(adapter: RealAdapter) -> Self {
        Self {
            api: Arc::new(adapter),
        }
    }

    /// For tests/injection (requires the `test-adapters` feature).
    #[cfg(feature = "test-adapters")]
    pub fn from_adapter(api: Arc<dyn CryptoCompareApi>) -> Self {
        Self { api }
    }

    /// Page backwards from `end` until `want` listed bars are collected, the
    /// provider runs out of history, or bars from before the listing appear.
    async fn collect_rows(
        &self,
        symbol: &Symbol,
        kind: HistoKind,
        want: usize,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<HistoRow>, FutureCoinError> {
        let what = format!("history for {symbol}");
        let mut to_ts = end.map(|e| e.timestamp() - 1);
        let mut pages: Vec<Vec<HistoRow>> = Vec::new();
        let mut have = 0usize;

        while have < want {
            let limit = u32::try_from(want - have)
                .unwrap_or(MAX_ROWS_PER_CALL)
                .min(MAX_ROWS_PER_CALL);
            let rows = self
                .api
                .histo(kind, symbol.as_str(), QUOTE_CCY, limit, to_ts)
                .await
                .map_err(|e| Self::normalize_error(e, &what))?;
            let Some(oldest) = rows.first().map(|r| r.time) else {
                break;
            };
            let fetched = rows.len();
            // Bars before the listing are zero-filled.
            let pre_listing = rows.iter().any(|r| r.close <= 0.0);
            let listed: Vec<HistoRow> = rows.into_iter().filter(|r| r.close > 0.0).collect();
            have += listed.len();
            pages.push(listed);

            if pre_listing || fetched < limit as usize {
                break;
            }
            to_ts = Some(oldest - 1);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(pages = pages.len(), rows = have, "collected histo pages");
        Ok(pages.into_iter().rev().flatten().collect())
    }
}

fn to_decimal(v: f64) -> Option<Decimal> {
    if !v.is_finite() {
        return None;
    }
    Decimal::from_f64(v).map(|d| d.round_dp(8))
}

fn row_to_candle(r: &HistoRow, symbol: &Symbol) -> Option<Candle> {
    Some(Candle {
        ts: DateTime::from_timestamp(r.time, 0)?,
        open: to_decimal(r.open)?,
        high: to_decimal(r.high)?,
        low: to_decimal(r.low)?,
        close: to_decimal(r.close)?,
        volume: to_decimal(r.volumefrom).unwrap_or(Decimal::ZERO),
        symbol: symbol.clone(),
        currency: Currency::Usd,
    })
}

#[async_trait]
impl HistoryProvider for CryptoCompareConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "futurecoin_cryptocompare::history",
            skip(self),
            fields(symbol = %symbol, interval = %req.interval, lookback = req.lookback),
        )
    )]
    async fn history(
        &self,
        symbol: &Symbol,
        req: HistoryRequest,
    ) -> Result<Dataset, FutureCoinError> {
        let kind = match req.interval {
            IntervalClass::Daily => HistoKind::Day,
            IntervalClass::Hourly => HistoKind::Hour,
        };
        let want = req.lookback.min(MAX_LOOKBACK) as usize;
        let rows = self.collect_rows(symbol, kind, want, req.end).await?;

        let candles = rows.iter().filter_map(|r| row_to_candle(r, symbol)).collect();
        let ds = Dataset::new(symbol.clone(), req.interval, Currency::Usd, candles);
        let keep = ds.tail(want).to_vec();
        Ok(Dataset::new(symbol.clone(), req.interval, Currency::Usd, keep))
    }

    fn supported_intervals(&self) -> &'static [IntervalClass] {
        INTERVALS
    }

    fn max_lookback(&self, _interval: IntervalClass) -> u32 {
        MAX_LOOKBACK
    }
}

#[async_trait]
impl QuoteProvider for CryptoCompareConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "futurecoin_cryptocompare::spot_price", skip(self), fields(symbol = %symbol))
    )]
    async fn spot_price(&self, symbol: &Symbol) -> Result<SpotPrice, FutureCoinError> {
        let what = format!("quote for {symbol}");
        let raw = self
            .api
            .price(symbol.as_str(), QUOTE_CCY)
            .await
            .map_err(|e| Self::normalize_error(e, &what))?;
        let price = to_decimal(raw)
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| FutureCoinError::not_found(what))?;
        Ok(SpotPrice {
            symbol: symbol.clone(),
            price,
            currency: Currency::Usd,
            as_of: Utc::now(),
        })
    }
}

impl FutureCoinConnector for CryptoCompareConnector {
    fn name(&self) -> &'static str {
        "futurecoin-cryptocompare"
    }

    fn vendor(&self) -> &'static str {
        "CryptoCompare"
    }

    fn as_history_provider(&self) -> Option<&dyn HistoryProvider> {
        Some(self as &dyn HistoryProvider)
    }

    fn as_quote_provider(&self) -> Option<&dyn QuoteProvider> {
        Some(self as &dyn QuoteProvider)
    }
}

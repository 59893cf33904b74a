//! futurecoin-yahoo
//!
//! Public connector that implements `FutureCoinConnector` on top of the Yahoo
//! Finance chart endpoint. Serves daily USD history for `{SYMBOL}-USD`
//! tickers, daily USD to INR exchange rates from `USDINR=X`, and spot prices.
#![warn(missing_docs)]

/// Adapter definitions and the production adapter backed by `reqwest`.
pub mod adapter;
mod builder;

use std::sync::Arc;

use adapter::{RealAdapter, YahooChart};
use adapter::{ChartQuery, ChartResult, ChartWindow};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use futurecoin_core::{
    Candle, Currency, Dataset, ExchangeRateSample, FutureCoinError, HistoryRequest,
    IntervalClass, RateRequest, RateTable, SpotPrice, Symbol,
    connector::{ConnectorKey, FutureCoinConnector, HistoryProvider, QuoteProvider, RateProvider},
};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

pub use builder::YahooConnectorBuilder;

#[cfg(feature = "test-adapters")]
type ChartAdapter = Arc<dyn YahooChart>;
#[cfg(not(feature = "test-adapters"))]
type ChartAdapter = Arc<RealAdapter>;

const DAILY_ONLY: &[IntervalClass] = &[IntervalClass::Daily];
const MAX_DAILY_LOOKBACK: u32 = 3650;
const USD_INR_TICKER: &str = "USDINR=X";

/// Public connector type. Production users will construct with `YahooConnector::new_default()`.
pub struct YahooConnector {
    chart: ChartAdapter,
}

impl YahooConnector {
    /// Static connector key for orchestrator priority configuration.
    pub const KEY: ConnectorKey = ConnectorKey::new("futurecoin-yahoo");

    fn looks_like_not_found(msg: &str) -> bool {
        let m = msg.to_ascii_lowercase();
        m.contains("not found") || m.contains("no data") || m.contains("delisted")
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

    /// Build against the public endpoint.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new_default() -> Result<Self, FutureCoinError> {
        Ok(Self::new_with_adapter(RealAdapter::new_default()?))
    }

    /// Build against a custom endpoint root.
    ///
    /// # Errors
    /// Returns `Config` for an invalid URL.
    pub fn with_base_url(base_url: &str) -> Result<Self, FutureCoinError> {
        Ok(Self::new_with_adapter(RealAdapter::with_base_url(base_url)?))
    }

    /// Build from a configured production adapter.
    #[must_use]
    pub fn new_with_adapter(adapter: RealAdapter) -> Self {
        Self {
            chart: Arc::new(adapter),
        }
    }

    /// For tests/injection (requires the `test-adapters` feature).
    #[cfg(feature = "test-adapters")]
    pub fn from_adapter(chart: Arc<dyn YahooChart>) -> Self {
        Self { chart }
    }

    /// Provider ticker for a crypto asset quoted in USD.
    #[must_use]
    pub fn ticker(symbol: &Symbol) -> String {
        format!("{}-USD", symbol.as_str())
    }

    async fn fetch_chart(
        &self,
        ticker: &str,
        query: ChartQuery,
        what: &str,
    ) -> Result<ChartResult, FutureCoinError> {
        self.chart
            .chart(ticker, query)
            .await
            .map_err(|e| Self::normalize_error(e, what))
    }
}

fn to_decimal(v: f64) -> Option<Decimal> {
    if !v.is_finite() {
        return None;
    }
    Decimal::from_f64(v).map(|d| d.round_dp(8))
}

/// Bar start as UTC; daily bars are keyed by the exchange-local calendar day.
fn bar_time(ts: i64, gmtoffset: i64, interval: IntervalClass) -> Option<DateTime<Utc>> {
    match interval {
        IntervalClass::Hourly => DateTime::from_timestamp(ts, 0),
        IntervalClass::Daily => DateTime::from_timestamp(ts.saturating_add(gmtoffset), 0)
            .map(|t| t.date_naive().and_time(NaiveTime::MIN).and_utc()),
    }
}

/// Rows with a missing open, high, low or close are skipped; missing volume reads as zero.
fn chart_candles(res: &ChartResult, symbol: &Symbol, interval: IntervalClass) -> Vec<Candle> {
    let Some(q) = res.indicators.quote.first() else {
        return Vec::new();
    };
    let at = |col: &[Option<f64>], i: usize| col.get(i).copied().flatten().and_then(to_decimal);
    res.timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &t)| {
            Some(Candle {
                ts: bar_time(t, res.meta.gmtoffset, interval)?,
                open: at(&q.open, i)?,
                high: at(&q.high, i)?,
                low: at(&q.low, i)?,
                close: at(&q.close, i)?,
                volume: at(&q.volume, i).unwrap_or(Decimal::ZERO),
                symbol: symbol.clone(),
                currency: Currency::Usd,
            })
        })
        .collect()
}

fn ensure_usd(res: &ChartResult, ticker: &str) -> Result<(), FutureCoinError> {
    match res.meta.currency.as_deref() {
        None | Some("USD") => Ok(()),
        Some(other) => Err(FutureCoinError::DataIntegrity(format!(
            "{ticker} is quoted in {other}, expected USD"
        ))),
    }
}

#[async_trait]
impl HistoryProvider for YahooConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "futurecoin_yahoo::history",
            skip(self),
            fields(symbol = %symbol, lookback = req.lookback),
        )
    )]
    async fn history(
        &self,
        symbol: &Symbol,
        req: HistoryRequest,
    ) -> Result<Dataset, FutureCoinError> {
        if req.interval != IntervalClass::Daily {
            return Err(FutureCoinError::unsupported(format!(
                "history/{}",
                req.interval
            )));
        }
        let end = req.end.unwrap_or_else(Utc::now);
        // Two spare days so the window still holds `lookback` bars after
        // the exclusive end trims today's bar.
        let start = req.window_start(end) - Duration::days(2);
        let ticker = Self::ticker(symbol);
        let query = ChartQuery {
            interval: "1d",
            window: ChartWindow::Between {
                start: start.timestamp(),
                end: end.timestamp(),
            },
        };
        let res = self
            .fetch_chart(&ticker, query, &format!("history for {symbol}"))
            .await?;
        ensure_usd(&res, &ticker)?;

        let mut rows = chart_candles(&res, symbol, req.interval);
        rows.retain(|c| c.ts < end);
        let ds = Dataset::new(symbol.clone(), req.interval, Currency::Usd, rows);
        let keep = ds.tail(req.lookback as usize).to_vec();
        Ok(Dataset::new(symbol.clone(), req.interval, Currency::Usd, keep))
    }

    fn supported_intervals(&self) -> &'static [IntervalClass] {
        DAILY_ONLY
    }

    fn max_lookback(&self, _interval: IntervalClass) -> u32 {
        MAX_DAILY_LOOKBACK
    }
}

#[async_trait]
impl QuoteProvider for YahooConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "futurecoin_yahoo::spot_price", skip(self), fields(symbol = %symbol))
    )]
    async fn spot_price(&self, symbol: &Symbol) -> Result<SpotPrice, FutureCoinError> {
        let what = format!("quote for {symbol}");
        let ticker = Self::ticker(symbol);
        let query = ChartQuery {
            interval: "1d",
            window: ChartWindow::Range("1d"),
        };
        let res = self.fetch_chart(&ticker, query, &what).await?;
        ensure_usd(&res, &ticker)?;

        let price = res
            .meta
            .regular_market_price
            .and_then(to_decimal)
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| FutureCoinError::not_found(what))?;
        let as_of = res
            .meta
            .regular_market_time
            .and_then(|t| DateTime::from_timestamp(t, 0))
            .unwrap_or_else(Utc::now);
        Ok(SpotPrice {
            symbol: symbol.clone(),
            price,
            currency: Currency::Usd,
            as_of,
        })
    }
}

#[async_trait]
impl RateProvider for YahooConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "futurecoin_yahoo::exchange_rates", skip(self))
    )]
    async fn exchange_rates(&self, req: RateRequest) -> Result<RateTable, FutureCoinError> {
        if !self.supports_pair(req.base, req.quote) {
            return Err(FutureCoinError::unsupported(format!(
                "exchange_rate/{}{}",
                req.base, req.quote
            )));
        }
        let what = format!("exchange rate {}/{}", req.base, req.quote);
        let end = Utc::now();
        let start = end - Duration::days(i64::from(req.days));
        let query = ChartQuery {
            interval: "1d",
            window: ChartWindow::Between {
                start: start.timestamp(),
                end: end.timestamp(),
            },
        };
        let res = self.fetch_chart(USD_INR_TICKER, query, &what).await?;

        let closes = res
            .indicators
            .quote
            .first()
            .map(|q| q.close.as_slice())
            .unwrap_or_default();
        let samples: Vec<ExchangeRateSample> = res
            .timestamp
            .iter()
            .zip(closes)
            .filter_map(|(&t, close)| {
                Some(ExchangeRateSample {
                    date: bar_time(t, res.meta.gmtoffset, IntervalClass::Daily)?.date_naive(),
                    rate: close.and_then(to_decimal)?,
                })
            })
            .collect();
        let table = RateTable::new(req.base, req.quote, samples);
        if table.is_empty() {
            return Err(FutureCoinError::not_found(what));
        }
        Ok(table)
    }

    fn supports_pair(&self, base: Currency, quote: Currency) -> bool {
        base == Currency::Usd && quote == Currency::Inr
    }
}

impl FutureCoinConnector for YahooConnector {
    fn name(&self) -> &'static str {
        "futurecoin-yahoo"
    }

    fn vendor(&self) -> &'static str {
        "Yahoo Finance"
    }

    fn as_history_provider(&self) -> Option<&dyn HistoryProvider> {
        Some(self as &dyn HistoryProvider)
    }

    fn as_quote_provider(&self) -> Option<&dyn QuoteProvider> {
        Some(self as &dyn QuoteProvider)
    }

    fn as_rate_provider(&self) -> Option<&dyn RateProvider> {
        Some(self as &dyn RateProvider)
    }
}

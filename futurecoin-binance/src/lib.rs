//! futurecoin-binance
//!
//! Public connector that implements `FutureCoinConnector` on top of the
//! Binance spot klines API. History and spot prices come from the
//! `{SYMBOL}USDT` pair, so the native currency is USDT.
#![warn(missing_docs)]

/// Adapter definitions and the production adapter backed by `reqwest`.
pub mod adapter;
mod builder;

use std::str::FromStr;
use std::sync::Arc;

use adapter::BinanceMarket;
use adapter::{Kline, MAX_KLINES, RealAdapter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futurecoin_core::{
    Candle, Currency, Dataset, FutureCoinError, HistoryRequest, IntervalClass, SpotPrice, Symbol,
    connector::{ConnectorKey, FutureCoinConnector, HistoryProvider, QuoteProvider},
};
use rust_decimal::Decimal;

pub use builder::BinanceConnectorBuilder;

#[cfg(feature = "test-adapters")]
type MarketAdapter = Arc<dyn BinanceMarket>;
#[cfg(not(feature = "test-adapters"))]
type MarketAdapter = Arc<RealAdapter>;

const INTERVALS: &[IntervalClass] = &[IntervalClass::Hourly, IntervalClass::Daily];

/// Public connector type. Production users will construct with `BinanceConnector::new_default()`.
pub struct BinanceConnector {
    market: MarketAdapter,
}

impl BinanceConnector {
    /// Static connector key for orchestrator priority configuration.
    pub const KEY: ConnectorKey = ConnectorKey::new("futurecoin-binance");

    fn looks_like_not_found(msg: &str) -> bool {
        let m = msg.to_ascii_lowercase();
        m.contains("invalid symbol") || m.contains("not found")
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
            market: Arc::new(adapter),
        }
    }

    /// For tests/injection (requires the `test-adapters` feature).
    #[cfg(feature = "test-adapters")]
    pub fn from_adapter(market: Arc<dyn BinanceMarket>) -> Self {
        Self { market }
    }

    /// Trading pair for a crypto asset quoted in USDT.
    #[must_use]
    pub fn pair(symbol: &Symbol) -> String {
        format!("{}USDT", symbol.as_str())
    }

    const fn interval_code(interval: IntervalClass) -> &'static str {
        match interval {
            IntervalClass::Daily => "1d",
            IntervalClass::Hourly => "1h",
        }
    }
}

fn parse_price(raw: &str, field: &str) -> Result<Decimal, FutureCoinError> {
    Decimal::from_str(raw.trim()).map_err(|e| {
        FutureCoinError::DataIntegrity(format!("{field} '{raw}' is not a decimal: {e}"))
    })
}

fn kline_to_candle(k: &Kline, symbol: &Symbol) -> Result<Candle, FutureCoinError> {
    let ts = DateTime::from_timestamp_millis(k.open_time).ok_or_else(|| {
        FutureCoinError::DataIntegrity(format!("open time {} out of range", k.open_time))
    })?;
    Ok(Candle {
        ts,
        open: parse_price(&k.open, "open")?,
        high: parse_price(&k.high, "high")?,
        low: parse_price(&k.low, "low")?,
        close: parse_price(&k.close, "close")?,
        volume: parse_price(&k.volume, "volume")?,
        symbol: symbol.clone(),
        currency: Currency::Usdt,
    })
}

#[async_trait]
impl HistoryProvider for BinanceConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "futurecoin_binance::history",
            skip(self),
            fields(symbol = %symbol, interval = %req.interval, lookback = req.lookback),
        )
    )]
    async fn history(
        &self,
        symbol: &Symbol,
        req: HistoryRequest,
    ) -> Result<Dataset, FutureCoinError> {
        // endTime is inclusive on open time; the request end is exclusive.
        let end_ms = req.end.map(|e| e.timestamp_millis() - 1);
        let klines = self
            .market
            .klines(
                &Self::pair(symbol),
                Self::interval_code(req.interval),
                req.lookback.min(MAX_KLINES),
                end_ms,
            )
            .await
            .map_err(|e| Self::normalize_error(e, &format!("history for {symbol}")))?;

        let mut rows = Vec::with_capacity(klines.len());
        for k in &klines {
            match kline_to_candle(k, symbol) {
                Ok(c) => rows.push(c),
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(error = %_e, "skipping malformed kline");
                }
            }
        }
        let ds = Dataset::new(symbol.clone(), req.interval, Currency::Usdt, rows);
        let keep = ds.tail(req.lookback as usize).to_vec();
        Ok(Dataset::new(symbol.clone(), req.interval, Currency::Usdt, keep))
    }

    fn supported_intervals(&self) -> &'static [IntervalClass] {
        INTERVALS
    }

    fn native_currency(&self) -> Currency {
        Currency::Usdt
    }

    fn max_lookback(&self, _interval: IntervalClass) -> u32 {
        MAX_KLINES
    }
}

#[async_trait]
impl QuoteProvider for BinanceConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "futurecoin_binance::spot_price", skip(self), fields(symbol = %symbol))
    )]
    async fn spot_price(&self, symbol: &Symbol) -> Result<SpotPrice, FutureCoinError> {
        let what = format!("quote for {symbol}");
        let ticker = self
            .market
            .ticker_price(&Self::pair(symbol))
            .await
            .map_err(|e| Self::normalize_error(e, &what))?;
        let price = parse_price(&ticker.price, "price")?;
        if price <= Decimal::ZERO {
            return Err(FutureCoinError::not_found(what));
        }
        Ok(SpotPrice {
            symbol: symbol.clone(),
            price,
            currency: Currency::Usdt,
            as_of: Utc::now(),
        })
    }
}

impl FutureCoinConnector for BinanceConnector {
    fn name(&self) -> &'static str {
        "futurecoin-binance"
    }

    fn vendor(&self) -> &'static str {
        "Binance"
    }

    fn as_history_provider(&self) -> Option<&dyn HistoryProvider> {
        Some(self as &dyn HistoryProvider)
    }

    fn as_quote_provider(&self) -> Option<&dyn QuoteProvider> {
        Some(self as &dyn QuoteProvider)
    }
}

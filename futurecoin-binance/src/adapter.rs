use std::fmt;
#[cfg(feature = "test-adapters")]
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futurecoin_core::FutureCoinError;
use reqwest::StatusCode;
use serde::de::{self, DeserializeOwned, IgnoredAny, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use url::Url;

/// Production base URL of the spot REST API.
pub const DEFAULT_BASE_URL: &str = "https://api.binance.com/";

const CONNECTOR: &str = "futurecoin-binance";

/// Largest `limit` the klines endpoint accepts.
pub const MAX_KLINES: u32 = 1000;

/// One kline row. The provider sends prices as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Kline {
    /// Open time in Unix milliseconds.
    pub open_time: i64,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
}

impl<'de> Deserialize<'de> for Kline {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        struct KlineVisitor;

        impl<'de> Visitor<'de> for KlineVisitor {
            type Value = Kline;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a kline array of at least six elements")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Kline, A::Error> {
                let open_time = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let open = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                let high = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(2, &self))?;
                let low = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(3, &self))?;
                let close = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(4, &self))?;
                let volume = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(5, &self))?;
                // close time, quote volume, trade count, taker volumes
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(Kline {
                    open_time,
                    open,
                    high,
                    low,
                    close,
                    volume,
                })
            }
        }

        d.deserialize_seq(KlineVisitor)
    }
}

/// Latest price for a trading pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TickerPrice {
    /// Trading pair, e.g. `BTCUSDT`.
    pub symbol: String,
    /// Last price as a decimal string.
    pub price: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

/// Market data abstraction (so we can inject mocks in tests).
#[async_trait]
pub trait BinanceMarket: Send + Sync {
    /// Fetch up to `limit` klines for `pair`, newest last.
    ///
    /// `end_ms` bounds open times inclusively; `None` means up to now.
    async fn klines(
        &self,
        pair: &str,
        interval: &'static str,
        limit: u32,
        end_ms: Option<i64>,
    ) -> Result<Vec<Kline>, FutureCoinError>;

    /// Fetch the latest price for `pair`.
    async fn ticker_price(&self, pair: &str) -> Result<TickerPrice, FutureCoinError>;
}

/// Production adapter calling the REST API over `reqwest`.
#[derive(Clone)]
pub struct RealAdapter {
    http: reqwest::Client,
    base: Url,
}

impl RealAdapter {
    /// Wrap an existing HTTP client.
    ///
    /// # Errors
    /// Returns `Config` when `base_url` is not an absolute URL.
    pub fn new(http: reqwest::Client, base_url: &str) -> Result<Self, FutureCoinError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| FutureCoinError::Config(format!("invalid base url '{base_url}': {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { http, base })
    }

    /// Adapter against the public endpoint.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new_default() -> Result<Self, FutureCoinError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Adapter against a custom endpoint (regional mirrors, test servers).
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed or the URL is invalid.
    pub fn with_base_url(base_url: &str) -> Result<Self, FutureCoinError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FutureCoinError::connector(CONNECTOR, e.to_string()))?;
        Self::new(http, base_url)
    }

    async fn get<T: DeserializeOwned + Send>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, FutureCoinError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| FutureCoinError::InvalidArg(format!("path '{path}': {e}")))?;
        let resp = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| transport(&e))?;

        let status = resp.status();
        // 418 follows repeated 429s once the IP is banned.
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::IM_A_TEAPOT {
            let retry_after_ms = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(|secs| secs.saturating_mul(1000));
            return Err(FutureCoinError::RateLimited {
                connector: CONNECTOR.into(),
                retry_after_ms,
            });
        }

        let body = resp.text().await.map_err(|e| transport(&e))?;
        if !status.is_success() {
            let msg = match serde_json::from_str::<ApiError>(&body) {
                Ok(api) => format!("{} ({})", api.msg, api.code),
                Err(_) => format!("HTTP {status}: {}", body.chars().take(200).collect::<String>()),
            };
            return Err(FutureCoinError::connector(CONNECTOR, msg));
        }
        serde_json::from_str(&body).map_err(|e| {
            FutureCoinError::DataIntegrity(format!("{CONNECTOR}: malformed {path} payload: {e}"))
        })
    }
}

fn transport(e: &reqwest::Error) -> FutureCoinError {
    if e.is_timeout() {
        FutureCoinError::provider_timeout(CONNECTOR, "http")
    } else {
        FutureCoinError::connector(CONNECTOR, e.to_string())
    }
}

#[async_trait]
impl BinanceMarket for RealAdapter {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "futurecoin_binance::klines", skip(self), err)
    )]
    async fn klines(
        &self,
        pair: &str,
        interval: &'static str,
        limit: u32,
        end_ms: Option<i64>,
    ) -> Result<Vec<Kline>, FutureCoinError> {
        let mut params = vec![
            ("symbol", pair.to_string()),
            ("interval", interval.to_string()),
            ("limit", limit.clamp(1, MAX_KLINES).to_string()),
        ];
        if let Some(end) = end_ms {
            params.push(("endTime", end.to_string()));
        }
        self.get("api/v3/klines", &params).await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "futurecoin_binance::ticker_price", skip(self), err)
    )]
    async fn ticker_price(&self, pair: &str) -> Result<TickerPrice, FutureCoinError> {
        self.get("api/v3/ticker/price", &[("symbol", pair.to_string())])
            .await
    }
}

#[cfg(feature = "test-adapters")]
impl dyn BinanceMarket {
    /// Build a `BinanceMarket` from closures (tests only).
    pub fn from_fns<FK, FT>(fk: FK, ft: FT) -> Arc<dyn BinanceMarket>
    where
        FK: Fn(&str, &'static str, u32, Option<i64>) -> Result<Vec<Kline>, FutureCoinError>
            + Send
            + Sync
            + 'static,
        FT: Fn(&str) -> Result<TickerPrice, FutureCoinError> + Send + Sync + 'static,
    {
        struct FnMarket<FK, FT> {
            fk: FK,
            ft: FT,
        }

        #[async_trait]
        impl<FK, FT> BinanceMarket for FnMarket<FK, FT>
        where
            FK: Fn(&str, &'static str, u32, Option<i64>) -> Result<Vec<Kline>, FutureCoinError>
                + Send
                + Sync
                + 'static,
            FT: Fn(&str) -> Result<TickerPrice, FutureCoinError> + Send + Sync + 'static,
        {
            async fn klines(
                &self,
                pair: &str,
                interval: &'static str,
                limit: u32,
                end_ms: Option<i64>,
            ) -> Result<Vec<Kline>, FutureCoinError> {
                (self.fk)(pair, interval, limit, end_ms)
            }

            async fn ticker_price(&self, pair: &str) -> Result<TickerPrice, FutureCoinError> {
                (self.ft)(pair)
            }
        }

        Arc::new(FnMarket { fk, ft })
    }

    /// Build a klines-only `BinanceMarket`; ticker calls are unsupported.
    pub fn from_klines_fn<FK>(fk: FK) -> Arc<dyn BinanceMarket>
    where
        FK: Fn(&str, &'static str, u32, Option<i64>) -> Result<Vec<Kline>, FutureCoinError>
            + Send
            + Sync
            + 'static,
    {
        Self::from_fns(fk, |_| Err(FutureCoinError::unsupported("quote")))
    }
}

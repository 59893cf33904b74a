#[cfg(feature = "test-adapters")]
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futurecoin_core::FutureCoinError;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

/// Production base URL of the chart API.
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/";

const CONNECTOR: &str = "futurecoin-yahoo";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Time window of a chart request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartWindow {
    /// A provider-defined range such as `1d` or `5d`.
    Range(&'static str),
    /// Unix-second bounds.
    Between {
        /// Inclusive start.
        start: i64,
        /// Exclusive end.
        end: i64,
    },
}

/// Parameters of one chart call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartQuery {
    /// Provider interval code (`1d`, `1h`).
    pub interval: &'static str,
    /// Requested window.
    pub window: ChartWindow,
}

/// Chart abstraction (so we can inject mocks in tests).
#[async_trait]
pub trait YahooChart: Send + Sync {
    /// Fetch the chart payload for a provider ticker such as `BTC-USD`.
    async fn chart(&self, ticker: &str, query: ChartQuery) -> Result<ChartResult, FutureCoinError>;
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

/// One instrument's chart payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartResult {
    /// Instrument metadata including the latest market price.
    #[serde(default)]
    pub meta: ChartMeta,
    /// Bar start times in Unix seconds.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    /// Column-oriented OHLCV values aligned with `timestamp`.
    #[serde(default)]
    pub indicators: Indicators,
}

/// Chart metadata block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    /// Quote currency code.
    #[serde(default)]
    pub currency: Option<String>,
    /// Provider ticker.
    #[serde(default)]
    pub symbol: String,
    /// Exchange offset from UTC in seconds; daily bars start at local midnight.
    #[serde(default)]
    pub gmtoffset: i64,
    /// Latest traded price.
    #[serde(default)]
    pub regular_market_price: Option<f64>,
    /// Unix time of `regular_market_price`.
    #[serde(default)]
    pub regular_market_time: Option<i64>,
}

/// Indicator columns.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Indicators {
    /// OHLCV columns; the provider returns a single entry.
    #[serde(default)]
    pub quote: Vec<QuoteColumns>,
}

/// OHLCV columns. Missing bars are `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[allow(missing_docs)]
pub struct QuoteColumns {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

/// Production adapter calling the chart endpoint over `reqwest`.
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
        Ok(Self {
            http,
            base: parse_base_url(base_url)?,
        })
    }

    /// Adapter against the public endpoint.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new_default() -> Result<Self, FutureCoinError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Adapter against a custom endpoint (proxies, test servers).
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed or the URL is invalid.
    pub fn with_base_url(base_url: &str) -> Result<Self, FutureCoinError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FutureCoinError::connector(CONNECTOR, e.to_string()))?;
        Self::new(http, base_url)
    }

    /// Endpoint root requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }
}

fn parse_base_url(raw: &str) -> Result<Url, FutureCoinError> {
    let mut url = Url::parse(raw)
        .map_err(|e| FutureCoinError::Config(format!("invalid base url '{raw}': {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn transport(e: &reqwest::Error) -> FutureCoinError {
    if e.is_timeout() {
        FutureCoinError::provider_timeout(CONNECTOR, "http")
    } else {
        FutureCoinError::connector(CONNECTOR, e.to_string())
    }
}

fn rate_limited(resp: &reqwest::Response) -> FutureCoinError {
    let retry_after_ms = resp
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(|secs| secs.saturating_mul(1000));
    FutureCoinError::RateLimited {
        connector: CONNECTOR.into(),
        retry_after_ms,
    }
}

#[async_trait]
impl YahooChart for RealAdapter {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "futurecoin_yahoo::chart", skip(self), err)
    )]
    async fn chart(&self, ticker: &str, query: ChartQuery) -> Result<ChartResult, FutureCoinError> {
        let url = self
            .base
            .join(&format!("v8/finance/chart/{ticker}"))
            .map_err(|e| FutureCoinError::InvalidArg(format!("ticker '{ticker}': {e}")))?;

        let mut params: Vec<(&str, String)> = vec![
            ("interval", query.interval.to_string()),
            ("includePrePost", "false".to_string()),
        ];
        match query.window {
            ChartWindow::Range(r) => params.push(("range", r.to_string())),
            ChartWindow::Between { start, end } => {
                params.push(("period1", start.to_string()));
                params.push(("period2", end.to_string()));
            }
        }

        let resp = self
            .http
            .get(url)
            .query(&params)
            .send()
            .await
            .map_err(|e| transport(&e))?;
        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(rate_limited(&resp));
        }
        let body = resp.text().await.map_err(|e| transport(&e))?;

        // Lookup failures arrive as a 404 with the reason inside the envelope.
        let envelope = serde_json::from_str::<ChartEnvelope>(&body);
        if !status.is_success() {
            let msg = match envelope {
                Ok(ChartEnvelope {
                    chart: ChartBody { error: Some(err), .. },
                }) => format!("{}: {}", err.code, err.description),
                _ => format!("HTTP {status}: {}", body.chars().take(200).collect::<String>()),
            };
            return Err(FutureCoinError::connector(CONNECTOR, msg));
        }

        let envelope = envelope.map_err(|e| {
            FutureCoinError::DataIntegrity(format!("{CONNECTOR}: malformed chart payload: {e}"))
        })?;
        if let Some(err) = envelope.chart.error {
            return Err(FutureCoinError::connector(
                CONNECTOR,
                format!("{}: {}", err.code, err.description),
            ));
        }
        envelope
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| FutureCoinError::connector(CONNECTOR, "no data in chart result"))
    }
}

#[cfg(feature = "test-adapters")]
impl dyn YahooChart {
    /// Build a `YahooChart` from a closure (tests only).
    pub fn from_fn<F>(f: F) -> Arc<dyn YahooChart>
    where
        F: Fn(&str, ChartQuery) -> Result<ChartResult, FutureCoinError> + Send + Sync + 'static,
    {
        struct FnChart<F>(F);

        #[async_trait]
        impl<F> YahooChart for FnChart<F>
        where
            F: Fn(&str, ChartQuery) -> Result<ChartResult, FutureCoinError>
                + Send
                + Sync
                + 'static,
        {
            async fn chart(
                &self,
                ticker: &str,
                query: ChartQuery,
            ) -> Result<ChartResult, FutureCoinError> {
                (self.0)(ticker, query)
            }
        }

        Arc::new(FnChart(f))
    }
}

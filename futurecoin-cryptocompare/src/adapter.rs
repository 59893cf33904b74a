#[cfg(feature = "test-adapters")]
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futurecoin_core::FutureCoinError;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

/// Production base URL of the min-api service.
pub const DEFAULT_BASE_URL: &str = "https://min-api.cryptocompare.com/";

const CONNECTOR: &str = "futurecoin-cryptocompare";

/// Largest `limit` a single histo call accepts.
pub const MAX_ROWS_PER_CALL: u32 = 2000;

/// Bar size of a histo endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoKind {
    /// `histoday`
    Day,
    /// `histohour`
    Hour,
}

impl HistoKind {
    const fn path(self) -> &'static str {
        match self {
            Self::Day => "data/v2/histoday",
            Self::Hour => "data/v2/histohour",
        }
    }
}

/// One histo bar; prices are in `tsym`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[allow(missing_docs)]
pub struct HistoRow {
    /// Bar start in Unix seconds.
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Volume in the base asset.
    #[serde(default)]
    pub volumefrom: f64,
    /// Volume in the quote currency.
    #[serde(default)]
    pub volumeto: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HistoEnvelope {
    response: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: HistoData,
}

#[derive(Debug, Default, Deserialize)]
struct HistoData {
    #[serde(default, rename = "Data")]
    rows: Vec<HistoRow>,
}

/// Market data abstraction (so we can inject mocks in tests).
#[async_trait]
pub trait CryptoCompareApi: Send + Sync {
    /// Fetch `limit + 1` bars ending at `to_ts` (inclusive, Unix seconds), oldest first.
    async fn histo(
        &self,
        kind: HistoKind,
        fsym: &str,
        tsym: &str,
        limit: u32,
        to_ts: Option<i64>,
    ) -> Result<Vec<HistoRow>, FutureCoinError>;

    /// Fetch the latest aggregated price of `fsym` in `tsym`.
    async fn price(&self, fsym: &str, tsym: &str) -> Result<f64, FutureCoinError>;
}

/// Production adapter calling the min-api over `reqwest`.
#[derive(Clone)]
pub struct RealAdapter {
    http: reqwest::Client,
    base: Url,
    api_key: Option<String>,
}

impl RealAdapter {
    /// Wrap an existing HTTP client.
    ///
    /// # Errors
    /// Returns `Config` when `base_url` is not an absolute URL.
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        api_key: Option<String>,
    ) -> Result<Self, FutureCoinError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| FutureCoinError::Config(format!("invalid base url '{base_url}': {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            http,
            base,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Anonymous adapter against the public endpoint.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new_default() -> Result<Self, FutureCoinError> {
        Self::with_base_url(DEFAULT_BASE_URL, None)
    }

    /// Adapter against a custom endpoint, optionally authenticated.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed or the URL is invalid.
    pub fn with_base_url(base_url: &str, api_key: Option<String>) -> Result<Self, FutureCoinError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FutureCoinError::connector(CONNECTOR, e.to_string()))?;
        Self::new(http, base_url, api_key)
    }

    /// True when requests carry an API key.
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn get_text(&self, path: &str, params: &[(&str, String)]) -> Result<String, FutureCoinError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| FutureCoinError::InvalidArg(format!("path '{path}': {e}")))?;
        let mut rb = self.http.get(url).query(params);
        if let Some(key) = &self.api_key {
            rb = rb.header(reqwest::header::AUTHORIZATION, format!("Apikey {key}"));
        }
        let resp = rb.send().await.map_err(|e| transport(&e))?;
        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(|secs| secs.saturating_mul(1000));
            return Err(rate_limited(retry_after_ms));
        }
        let body = resp.text().await.map_err(|e| transport(&e))?;
        if !status.is_success() {
            return Err(FutureCoinError::connector(
                CONNECTOR,
                format!("HTTP {status}: {}", body.chars().take(200).collect::<String>()),
            ));
        }
        Ok(body)
    }
}

fn transport(e: &reqwest::Error) -> FutureCoinError {
    if e.is_timeout() {
        FutureCoinError::provider_timeout(CONNECTOR, "http")
    } else {
        FutureCoinError::connector(CONNECTOR, e.to_string())
    }
}

fn rate_limited(retry_after_ms: Option<u64>) -> FutureCoinError {
    FutureCoinError::RateLimited {
        connector: CONNECTOR.into(),
        retry_after_ms,
    }
}

/// Errors arrive with HTTP 200 and `"Response": "Error"`.
fn api_error(message: &str) -> FutureCoinError {
    if message.to_ascii_lowercase().contains("rate limit") {
        return rate_limited(None);
    }
    FutureCoinError::connector(CONNECTOR, message.to_string())
}

fn malformed(what: &str, e: &serde_json::Error) -> FutureCoinError {
    FutureCoinError::DataIntegrity(format!("{CONNECTOR}: malformed {what} payload: {e}"))
}

#[async_trait]
impl CryptoCompareApi for RealAdapter {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "futurecoin_cryptocompare::histo", skip(self), err)
    )]
    async fn histo(
        &self,
        kind: HistoKind,
        fsym: &str,
        tsym: &str,
        limit: u32,
        to_ts: Option<i64>,
    ) -> Result<Vec<HistoRow>, FutureCoinError> {
        let mut params = vec![
            ("fsym", fsym.to_string()),
            ("tsym", tsym.to_string()),
            ("limit", limit.clamp(1, MAX_ROWS_PER_CALL).to_string()),
        ];
        if let Some(ts) = to_ts {
            params.push(("toTs", ts.to_string()));
        }
        let body = self.get_text(kind.path(), &params).await?;
        let env: HistoEnvelope =
            serde_json::from_str(&body).map_err(|e| malformed(kind.path(), &e))?;
        if env.response != "Success" {
            return Err(api_error(&env.message));
        }
        Ok(env.data.rows)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "futurecoin_cryptocompare::price", skip(self), err)
    )]
    async fn price(&self, fsym: &str, tsym: &str) -> Result<f64, FutureCoinError> {
        let params = [("fsym", fsym.to_string()), ("tsyms", tsym.to_string())];
        let body = self.get_text("data/price", &params).await?;
        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| malformed("price", &e))?;
        if value.get("Response").and_then(|r| r.as_str()) == Some("Error") {
            let msg = value.get("Message").and_then(|m| m.as_str()).unwrap_or("error");
            return Err(api_error(msg));
        }
        value.get(tsym).and_then(serde_json::Value::as_f64).ok_or_else(|| {
            FutureCoinError::connector(CONNECTOR, format!("no {tsym} price for {fsym}: not found"))
        })
    }
}

#[cfg(feature = "test-adapters")]
impl dyn CryptoCompareApi {
    /// Build a `CryptoCompareApi` from closures (tests only).
    pub fn from_fns<FH, FP>(fh: FH, fp: FP) -> Arc<dyn CryptoCompareApi>
    where
        FH: Fn(HistoKind, &str, u32, Option<i64>) -> Result<Vec<HistoRow>, FutureCoinError>
            + Send
            + Sync
            + 'static,
        FP: Fn(&str) -> Result<f64, FutureCoinError> + Send + Sync + 'static,
    {
        struct FnApi<FH, FP> {
            fh: FH,
            fp: FP,
        }

        #[async_trait]
        impl<FH, FP> CryptoCompareApi for FnApi<FH, FP>
        where
            FH: Fn(HistoKind, &str, u32, Option<i64>) -> Result<Vec<HistoRow>, FutureCoinError>
                + Send
                + Sync
                + 'static,
            FP: Fn(&str) -> Result<f64, FutureCoinError> + Send + Sync + 'static,
        {
            async fn histo(
                &self,
                kind: HistoKind,
                fsym: &str,
                _tsym: &str,
                limit: u32,
                to_ts: Option<i64>,
            ) -> Result<Vec<HistoRow>, FutureCoinError> {
                (self.fh)(kind, fsym, limit, to_ts)
            }

            async fn price(&self, fsym: &str, _tsym: &str) -> Result<f64, FutureCoinError> {
                (self.fp)(fsym)
            }
        }

        Arc::new(FnApi { fh, fp })
    }
}

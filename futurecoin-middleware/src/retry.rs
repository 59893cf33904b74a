//! Bounded retries with exponential backoff for transient provider failures.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futurecoin_core::connector::{
    FutureCoinConnector, HistoryProvider, QuoteProvider, RateProvider,
};
use futurecoin_core::{
    BackoffConfig, Currency, Dataset, FutureCoinError, HistoryRequest, IntervalClass, Middleware,
    RateRequest, RateTable, SpotPrice, Symbol,
};
use rand::Rng;

const NO_INTERVALS: &[IntervalClass] = &[];

/// Connector wrapper that retries calls failing with a retryable error.
///
/// A call is attempted at most `attempts` times. Errors for which
/// [`FutureCoinError::is_retryable`] is false are returned immediately.
pub struct RetryingConnector {
    inner: Arc<dyn FutureCoinConnector>,
    attempts: u32,
    backoff: BackoffConfig,
}

impl RetryingConnector {
    /// Wrap `inner`; `attempts` is clamped to at least one.
    pub fn new(inner: Arc<dyn FutureCoinConnector>, attempts: u32, backoff: BackoffConfig) -> Self {
        Self {
            inner,
            attempts: attempts.max(1),
            backoff,
        }
    }

    /// Delay before retry number `retry` (zero-based), jitter included.
    ///
    /// A server-provided `retry_after_ms` raises the delay but never past
    /// `max_backoff_ms`.
    fn delay(&self, retry: u32, err: &FutureCoinError) -> Duration {
        let cfg = &self.backoff;
        let factor = u64::from(cfg.factor.max(1));
        let mut base_ms = cfg
            .min_backoff_ms
            .saturating_mul(factor.saturating_pow(retry))
            .min(cfg.max_backoff_ms);
        if let FutureCoinError::RateLimited {
            retry_after_ms: Some(after),
            ..
        } = err
        {
            base_ms = base_ms.max(*after).min(cfg.max_backoff_ms);
        }
        let jitter_range = base_ms.saturating_mul(u64::from(cfg.jitter_percent.min(100))) / 100;
        let jitter = if jitter_range == 0 {
            0
        } else {
            rand::rng().random_range(0..=jitter_range)
        };
        Duration::from_millis(base_ms.saturating_add(jitter))
    }

    async fn run<T, F, Fut>(&self, capability: &'static str, mut call: F) -> Result<T, FutureCoinError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, FutureCoinError>> + Send,
        T: Send,
    {
        let mut retry = 0u32;
        loop {
            match call().await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_retryable() && retry + 1 < self.attempts => {
                    let wait = self.delay(retry, &e);
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        connector = self.inner.name(),
                        capability,
                        retry,
                        wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "retrying provider call"
                    );
                    #[cfg(not(feature = "tracing"))]
                    let _ = capability;
                    tokio::time::sleep(wait).await;
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl FutureCoinConnector for RetryingConnector {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn vendor(&self) -> &'static str {
        self.inner.vendor()
    }

    futurecoin_core::futurecoin_connector_accessors!(inner);
}

#[async_trait]
impl HistoryProvider for RetryingConnector {
    async fn history(
        &self,
        symbol: &Symbol,
        req: HistoryRequest,
    ) -> Result<Dataset, FutureCoinError> {
        let inner = self
            .inner
            .as_history_provider()
            .ok_or_else(|| FutureCoinError::unsupported("history"))?;
        self.run("history", || inner.history(symbol, req)).await
    }

    fn supported_intervals(&self) -> &'static [IntervalClass] {
        self.inner
            .as_history_provider()
            .map_or(NO_INTERVALS, |h| h.supported_intervals())
    }

    fn native_currency(&self) -> Currency {
        self.inner
            .as_history_provider()
            .map_or(Currency::Usd, |h| h.native_currency())
    }

    fn max_lookback(&self, interval: IntervalClass) -> u32 {
        self.inner
            .as_history_provider()
            .map_or(u32::MAX, |h| h.max_lookback(interval))
    }
}

#[async_trait]
impl QuoteProvider for RetryingConnector {
    async fn spot_price(&self, symbol: &Symbol) -> Result<SpotPrice, FutureCoinError> {
        let inner = self
            .inner
            .as_quote_provider()
            .ok_or_else(|| FutureCoinError::unsupported("quote"))?;
        self.run("quote", || inner.spot_price(symbol)).await
    }
}

#[async_trait]
impl RateProvider for RetryingConnector {
    async fn exchange_rates(&self, req: RateRequest) -> Result<RateTable, FutureCoinError> {
        let inner = self
            .inner
            .as_rate_provider()
            .ok_or_else(|| FutureCoinError::unsupported("exchange_rate"))?;
        self.run("exchange_rate", || inner.exchange_rates(req)).await
    }

    fn supports_pair(&self, base: Currency, quote: Currency) -> bool {
        self.inner
            .as_rate_provider()
            .is_some_and(|r| r.supports_pair(base, quote))
    }
}

/// Declarative retry layer for [`ConnectorBuilder`](crate::ConnectorBuilder).
pub struct RetryMiddleware {
    attempts: u32,
    backoff: BackoffConfig,
}

impl RetryMiddleware {
    /// Retry up to `attempts` total calls with the given backoff.
    #[must_use]
    pub const fn new(attempts: u32, backoff: BackoffConfig) -> Self {
        Self { attempts, backoff }
    }
}

impl Middleware for RetryMiddleware {
    fn apply(self: Box<Self>, inner: Arc<dyn FutureCoinConnector>) -> Arc<dyn FutureCoinConnector> {
        Arc::new(RetryingConnector::new(inner, self.attempts, self.backoff))
    }

    fn name(&self) -> &'static str {
        "RetryMiddleware"
    }

    fn config_json(&self) -> serde_json::Value {
        serde_json::json!({
            "attempts": self.attempts,
            "min_backoff_ms": self.backoff.min_backoff_ms,
            "max_backoff_ms": self.backoff.max_backoff_ms,
            "factor": self.backoff.factor,
            "jitter_percent": self.backoff.jitter_percent,
        })
    }
}

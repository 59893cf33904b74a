use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futurecoin_core::connector::{
    FutureCoinConnector, HistoryProvider, QuoteProvider, RateProvider,
};
use futurecoin_core::{
    Currency, Dataset, FutureCoinError, HistoryRequest, IntervalClass, Middleware, RateRequest,
    RateTable, SpotPrice, Symbol,
};

const NO_INTERVALS: &[IntervalClass] = &[];

/// Middleware that blacklists its inner connector for a period after it
/// reports rate limiting.
///
/// While blacklisted every call fails fast with `TemporarilyBlacklisted`,
/// which lets the orchestrator move on to the next provider.
pub struct BlacklistingMiddleware {
    inner: Arc<dyn FutureCoinConnector>,
    state: Mutex<Option<Instant>>, // blacklisted until; None means active
    default_duration: Duration,
}

impl BlacklistingMiddleware {
    /// Wrap `inner`; `default_duration` applies when the provider gives no retry hint.
    pub fn new(inner: Arc<dyn FutureCoinConnector>, default_duration: Duration) -> Self {
        Self {
            inner,
            state: Mutex::new(None),
            default_duration,
        }
    }

    fn remaining(&self) -> Option<Duration> {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        match *guard {
            Some(until) if now < until => Some(until - now),
            Some(_) => {
                *guard = None;
                None
            }
            None => None,
        }
    }

    fn check(&self) -> Result<(), FutureCoinError> {
        match self.remaining() {
            Some(left) => Err(FutureCoinError::TemporarilyBlacklisted {
                reset_in_ms: u64::try_from(left.as_millis()).unwrap_or(u64::MAX).max(1),
            }),
            None => Ok(()),
        }
    }

    fn handle_error(&self, err: FutureCoinError) -> FutureCoinError {
        if let FutureCoinError::RateLimited { retry_after_ms, .. } = &err {
            let duration = retry_after_ms
                .filter(|ms| *ms > 0)
                .map_or(self.default_duration, Duration::from_millis);
            #[cfg(feature = "tracing")]
            tracing::warn!(
                connector = self.inner.name(),
                blacklist_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                "provider rate limited; blacklisting"
            );
            let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            *guard = Some(Instant::now() + duration);
        }
        err
    }
}

impl FutureCoinConnector for BlacklistingMiddleware {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn vendor(&self) -> &'static str {
        self.inner.vendor()
    }

    futurecoin_core::futurecoin_connector_accessors!(inner);
}

#[async_trait]
impl HistoryProvider for BlacklistingMiddleware {
    async fn history(
        &self,
        symbol: &Symbol,
        req: HistoryRequest,
    ) -> Result<Dataset, FutureCoinError> {
        self.check()?;
        let inner = self
            .inner
            .as_history_provider()
            .ok_or_else(|| FutureCoinError::unsupported("history"))?;
        inner
            .history(symbol, req)
            .await
            .map_err(|e| self.handle_error(e))
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
impl QuoteProvider for BlacklistingMiddleware {
    async fn spot_price(&self, symbol: &Symbol) -> Result<SpotPrice, FutureCoinError> {
        self.check()?;
        let inner = self
            .inner
            .as_quote_provider()
            .ok_or_else(|| FutureCoinError::unsupported("quote"))?;
        inner
            .spot_price(symbol)
            .await
            .map_err(|e| self.handle_error(e))
    }
}

#[async_trait]
impl RateProvider for BlacklistingMiddleware {
    async fn exchange_rates(&self, req: RateRequest) -> Result<RateTable, FutureCoinError> {
        self.check()?;
        let inner = self
            .inner
            .as_rate_provider()
            .ok_or_else(|| FutureCoinError::unsupported("exchange_rate"))?;
        inner
            .exchange_rates(req)
            .await
            .map_err(|e| self.handle_error(e))
    }

    fn supports_pair(&self, base: Currency, quote: Currency) -> bool {
        self.inner
            .as_rate_provider()
            .is_some_and(|r| r.supports_pair(base, quote))
    }
}

/// Declarative blacklist layer for [`ConnectorBuilder`](crate::ConnectorBuilder).
pub struct BlacklistMiddleware {
    default_duration: Duration,
}

impl BlacklistMiddleware {
    /// Blacklist for `default_duration` unless the provider suggests otherwise.
    #[must_use]
    pub const fn new(default_duration: Duration) -> Self {
        Self { default_duration }
    }
}

impl Middleware for BlacklistMiddleware {
    fn apply(self: Box<Self>, inner: Arc<dyn FutureCoinConnector>) -> Arc<dyn FutureCoinConnector> {
        Arc::new(BlacklistingMiddleware::new(inner, self.default_duration))
    }

    fn name(&self) -> &'static str {
        "BlacklistingMiddleware"
    }

    fn config_json(&self) -> serde_json::Value {
        serde_json::json!({
            "default_duration_ms": u64::try_from(self.default_duration.as_millis()).unwrap_or(u64::MAX),
        })
    }
}

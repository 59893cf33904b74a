use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futurecoin_core::connector::{
    FutureCoinConnector, HistoryProvider, QuoteProvider, RateProvider,
};
use futurecoin_core::{
    Currency, Dataset, FutureCoinError, HistoryRequest, IntervalClass, Middleware, RateRequest,
    RateTable, SpotPrice, Symbol,
};
use moka::future::Cache;

const NO_INTERVALS: &[IntervalClass] = &[];

/// TTLs and capacity for [`CachingConnector`]. A `None` TTL disables the
/// cache for that capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Lifetime of cached history responses.
    pub history_ttl: Option<Duration>,
    /// Lifetime of cached exchange-rate tables.
    pub rate_ttl: Option<Duration>,
    /// Lifetime of cached spot prices.
    pub quote_ttl: Option<Duration>,
    /// Maximum entries per capability.
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            history_ttl: Some(Duration::from_secs(300)),
            rate_ttl: Some(Duration::from_secs(3_600)),
            quote_ttl: None,
            max_entries: 1_024,
        }
    }
}

fn store<K, V>(ttl: Option<Duration>, capacity: u64) -> Option<Cache<K, Arc<V>>>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    let ttl = ttl.filter(|d| !d.is_zero())?;
    Some(
        Cache::builder()
            .max_capacity(capacity.max(1))
            .time_to_live(ttl)
            .build(),
    )
}

/// Connector wrapper that caches successful responses; errors are never cached.
pub struct CachingConnector {
    inner: Arc<dyn FutureCoinConnector>,
    history: Option<Cache<(Symbol, HistoryRequest), Arc<Dataset>>>,
    rates: Option<Cache<RateRequest, Arc<RateTable>>>,
    quotes: Option<Cache<Symbol, Arc<SpotPrice>>>,
}

impl CachingConnector {
    /// Wrap `inner` with caches sized and timed by `cfg`.
    #[must_use]
    pub fn new(inner: Arc<dyn FutureCoinConnector>, cfg: &CacheConfig) -> Self {
        Self {
            inner,
            history: store(cfg.history_ttl, cfg.max_entries),
            rates: store(cfg.rate_ttl, cfg.max_entries),
            quotes: store(cfg.quote_ttl, cfg.max_entries),
        }
    }
}

impl FutureCoinConnector for CachingConnector {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn vendor(&self) -> &'static str {
        self.inner.vendor()
    }

    futurecoin_core::futurecoin_connector_accessors!(inner);
}

#[async_trait]
impl HistoryProvider for CachingConnector {
    async fn history(
        &self,
        symbol: &Symbol,
        req: HistoryRequest,
    ) -> Result<Dataset, FutureCoinError> {
        let inner = self
            .inner
            .as_history_provider()
            .ok_or_else(|| FutureCoinError::unsupported("history"))?;
        let Some(cache) = &self.history else {
            return inner.history(symbol, req).await;
        };
        let key = (symbol.clone(), req);
        if let Some(hit) = cache.get(&key).await {
            return Ok((*hit).clone());
        }
        let value = inner.history(symbol, req).await?;
        cache.insert(key, Arc::new(value.clone())).await;
        Ok(value)
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
impl QuoteProvider for CachingConnector {
    async fn spot_price(&self, symbol: &Symbol) -> Result<SpotPrice, FutureCoinError> {
        let inner = self
            .inner
            .as_quote_provider()
            .ok_or_else(|| FutureCoinError::unsupported("quote"))?;
        let Some(cache) = &self.quotes else {
            return inner.spot_price(symbol).await;
        };
        if let Some(hit) = cache.get(symbol).await {
            return Ok((*hit).clone());
        }
        let value = inner.spot_price(symbol).await?;
        cache.insert(symbol.clone(), Arc::new(value.clone())).await;
        Ok(value)
    }
}

#[async_trait]
impl RateProvider for CachingConnector {
    async fn exchange_rates(&self, req: RateRequest) -> Result<RateTable, FutureCoinError> {
        let inner = self
            .inner
            .as_rate_provider()
            .ok_or_else(|| FutureCoinError::unsupported("exchange_rate"))?;
        let Some(cache) = &self.rates else {
            return inner.exchange_rates(req).await;
        };
        if let Some(hit) = cache.get(&req).await {
            return Ok((*hit).clone());
        }
        let value = inner.exchange_rates(req).await?;
        cache.insert(req, Arc::new(value.clone())).await;
        Ok(value)
    }

    fn supports_pair(&self, base: Currency, quote: Currency) -> bool {
        self.inner
            .as_rate_provider()
            .is_some_and(|r| r.supports_pair(base, quote))
    }
}

/// Declarative caching layer for [`ConnectorBuilder`](crate::ConnectorBuilder).
pub struct CacheMiddleware {
    cfg: CacheConfig,
}

impl CacheMiddleware {
    /// Cache with the given configuration.
    #[must_use]
    pub const fn new(cfg: CacheConfig) -> Self {
        Self { cfg }
    }
}

impl Middleware for CacheMiddleware {
    fn apply(self: Box<Self>, inner: Arc<dyn FutureCoinConnector>) -> Arc<dyn FutureCoinConnector> {
        let Self { cfg } = *self;
        Arc::new(CachingConnector::new(inner, &cfg))
    }

    fn name(&self) -> &'static str {
        "CachingMiddleware"
    }

    fn config_json(&self) -> serde_json::Value {
        let ms = |d: Option<Duration>| d.map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
        serde_json::json!({
            "history_ttl_ms": ms(self.cfg.history_ttl),
            "rate_ttl_ms": ms(self.cfg.rate_ttl),
            "quote_ttl_ms": ms(self.cfg.quote_ttl),
            "max_entries": self.cfg.max_entries,
        })
    }
}

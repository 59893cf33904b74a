use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futurecoin_core::connector::ConnectorKey;
use futurecoin_core::{
    CurrencyPolicy, DatasetStore, FallbackEstimator, FallbackKind, FetchStrategy,
    FutureCoinConfig, FutureCoinConnector, FutureCoinError, IntervalClass, Limits, ModelRegistry,
    Symbol, estimator_for,
};
use tokio::sync::RwLock;

/// Orchestrator that routes requests across registered providers and serves predictions.
pub struct FutureCoin {
    pub(crate) connectors: Vec<Arc<dyn FutureCoinConnector>>,
    pub(crate) cfg: FutureCoinConfig,
    pub(crate) models: RwLock<Arc<ModelRegistry>>,
    pub(crate) estimator: Arc<dyn FallbackEstimator>,
    pub(crate) store: Option<DatasetStore>,
}

/// Builder for constructing a `FutureCoin` orchestrator with custom configuration.
pub struct FutureCoinBuilder {
    connectors: Vec<Arc<dyn FutureCoinConnector>>,
    cfg: FutureCoinConfig,
    models: ModelRegistry,
    estimator: Option<Arc<dyn FallbackEstimator>>,
    store: Option<DatasetStore>,
}

impl Default for FutureCoinBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FutureCoinBuilder {
    /// Create a new builder with default configuration and no connectors.
    ///
    /// Defaults: priority-with-fallback fetches, 10s provider timeout, no
    /// request deadline, 60-candle lookbacks, daily predictions in INR and
    /// hourly predictions in USDT, seeded-noise fallback, empty model registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connectors: vec![],
            cfg: FutureCoinConfig::default(),
            models: ModelRegistry::empty(),
            estimator: None,
            store: None,
        }
    }

    /// Replace the whole configuration. Priorities set earlier are discarded.
    #[must_use]
    pub fn config(mut self, cfg: FutureCoinConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Register a provider connector.
    ///
    /// Registration order is used when no explicit priority applies.
    #[must_use]
    pub fn with_connector(mut self, c: Arc<dyn FutureCoinConnector>) -> Self {
        self.connectors.push(c);
        self
    }

    /// Set preferred providers for an interval class.
    ///
    /// This orders eligible providers; unlisted connectors stay eligible after
    /// the listed ones. Per-symbol preferences take precedence.
    #[must_use]
    pub fn prefer_for_interval(
        mut self,
        interval: IntervalClass,
        connectors_desc: &[Arc<dyn FutureCoinConnector>],
    ) -> Self {
        let keys: Vec<ConnectorKey> = connectors_desc.iter().map(|c| c.key()).collect();
        self.cfg.per_interval_priority.insert(interval, keys);
        self
    }

    /// Set preferred providers for a symbol, overriding interval preferences.
    #[must_use]
    pub fn prefer_symbol(
        mut self,
        symbol: &Symbol,
        connectors_desc: &[Arc<dyn FutureCoinConnector>],
    ) -> Self {
        let keys: Vec<ConnectorKey> = connectors_desc.iter().map(|c| c.key()).collect();
        self.cfg.per_symbol_priority.insert(symbol.clone(), keys);
        self
    }

    /// Select the fetch strategy for multi-provider requests.
    ///
    /// `PriorityWithFallback` walks providers in order; `Latency` races them
    /// and keeps the first success.
    #[must_use]
    pub const fn fetch_strategy(mut self, strategy: FetchStrategy) -> Self {
        self.cfg.fetch_strategy = strategy;
        self
    }

    /// Set the per-provider request timeout.
    #[must_use]
    pub const fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.provider_timeout = timeout;
        self
    }

    /// Set an overall deadline for fan-out operations such as bulk downloads.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.request_timeout = Some(timeout);
        self
    }

    /// Set lookback and horizon bounds.
    #[must_use]
    pub const fn limits(mut self, limits: Limits) -> Self {
        self.cfg.limits = limits;
        self
    }

    /// Set the output currency per interval class.
    #[must_use]
    pub const fn currencies(mut self, currencies: CurrencyPolicy) -> Self {
        self.cfg.currencies = currencies;
        self
    }

    /// Restrict fetch and predict operations to these symbols.
    #[must_use]
    pub fn supported_symbols(mut self, symbols: Vec<Symbol>) -> Self {
        self.cfg.supported_symbols = symbols;
        self
    }

    /// Select the built-in fallback estimator.
    #[must_use]
    pub fn fallback(mut self, kind: FallbackKind) -> Self {
        self.cfg.fallback = kind;
        self.estimator = None;
        self
    }

    /// Inject a custom fallback estimator, overriding [`fallback`](Self::fallback).
    #[must_use]
    pub fn fallback_estimator(mut self, estimator: Arc<dyn FallbackEstimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    /// Install the initial model registry.
    #[must_use]
    pub fn models(mut self, registry: ModelRegistry) -> Self {
        self.models = registry;
        self
    }

    /// Persist downloaded datasets into this store.
    #[must_use]
    pub fn store(mut self, store: DatasetStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the `FutureCoin` orchestrator.
    ///
    /// Priority lists naming unregistered connectors are filtered and de-duplicated.
    ///
    /// # Errors
    /// Returns `InvalidArg` if no connectors have been registered or the
    /// supported symbol set is empty.
    pub fn build(mut self) -> Result<FutureCoin, FutureCoinError> {
        let known: HashSet<&'static str> = self.connectors.iter().map(|c| c.name()).collect();

        let filter_keys = |v: &mut Vec<ConnectorKey>| {
            let mut seen: HashSet<&'static str> = HashSet::new();
            v.retain(|k| known.contains(k.as_str()) && seen.insert(k.as_str()));
        };
        for v in self.cfg.per_interval_priority.values_mut() {
            filter_keys(v);
        }
        for v in self.cfg.per_symbol_priority.values_mut() {
            filter_keys(v);
        }

        if self.connectors.is_empty() {
            return Err(FutureCoinError::InvalidArg(
                "no connectors registered; add at least one via with_connector(...)".to_string(),
            ));
        }
        if self.cfg.supported_symbols.is_empty() {
            return Err(FutureCoinError::InvalidArg(
                "supported symbol set is empty".to_string(),
            ));
        }

        let estimator = self
            .estimator
            .unwrap_or_else(|| estimator_for(self.cfg.fallback));
        Ok(FutureCoin {
            connectors: self.connectors,
            cfg: self.cfg,
            models: RwLock::new(Arc::new(self.models)),
            estimator,
            store: self.store,
        })
    }
}

/// Tag an error with the connector that produced it, keeping errors that
/// already carry routing information.
pub fn tag_err(connector: &str, e: FutureCoinError) -> FutureCoinError {
    match e {
        e @ (FutureCoinError::NotFound { .. }
        | FutureCoinError::ProviderTimeout { .. }
        | FutureCoinError::Connector { .. }
        | FutureCoinError::RateLimited { .. }
        | FutureCoinError::TemporarilyBlacklisted { .. }
        | FutureCoinError::Unsupported { .. }
        | FutureCoinError::RequestTimeout { .. }
        | FutureCoinError::AllProvidersTimedOut { .. }
        | FutureCoinError::AllProvidersFailed(_)) => e,
        other => FutureCoinError::Connector {
            connector: connector.to_string(),
            msg: other.to_string(),
        },
    }
}

/// Run `fut` under an optional deadline, mapping expiry to `RequestTimeout("request")`.
pub(crate) async fn with_request_deadline<F, T>(
    deadline: Option<Duration>,
    fut: F,
) -> Result<T, FutureCoinError>
where
    F: core::future::Future<Output = T>,
{
    match deadline {
        Some(d) => tokio::time::timeout(d, fut)
            .await
            .map_err(|_| FutureCoinError::request_timeout("request")),
        None => Ok(fut.await),
    }
}

impl FutureCoin {
    /// Start building a new `FutureCoin` instance.
    ///
    /// ```rust,ignore
    /// use std::sync::Arc;
    /// use futurecoin::{FutureCoin, FetchStrategy, IntervalClass};
    ///
    /// let yahoo = Arc::new(YahooConnector::new_default()?);
    /// let binance = Arc::new(BinanceConnector::new_default()?);
    ///
    /// let fc = FutureCoin::builder()
    ///     .with_connector(yahoo.clone())
    ///     .with_connector(binance.clone())
    ///     .prefer_for_interval(IntervalClass::Hourly, &[binance, yahoo])
    ///     .fetch_strategy(FetchStrategy::PriorityWithFallback)
    ///     .build()?;
    /// ```
    #[must_use]
    pub fn builder() -> FutureCoinBuilder {
        FutureCoinBuilder::new()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &FutureCoinConfig {
        &self.cfg
    }

    /// Names of registered connectors in registration order.
    #[must_use]
    pub fn connector_names(&self) -> Vec<&'static str> {
        self.connectors.iter().map(|c| c.name()).collect()
    }

    /// Label of the active fallback estimator.
    #[must_use]
    pub fn fallback_name(&self) -> &'static str {
        self.estimator.name()
    }

    /// Dataset store used by downloads, if configured.
    #[must_use]
    pub const fn store(&self) -> Option<&DatasetStore> {
        self.store.as_ref()
    }

    /// Snapshot of the current model registry.
    pub async fn models(&self) -> Arc<ModelRegistry> {
        Arc::clone(&*self.models.read().await)
    }

    /// Swap in a new model registry; in-flight requests keep their snapshot.
    pub async fn replace_models(&self, registry: ModelRegistry) {
        *self.models.write().await = Arc::new(registry);
    }

    /// Wrap a provider future with a timeout and standardized timeout error mapping.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "futurecoin::core::provider_call_with_timeout",
            skip(fut),
            fields(
                connector = connector_name,
                capability = capability,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            ),
        )
    )]
    pub(crate) async fn provider_call_with_timeout<T, Fut>(
        connector_name: &'static str,
        capability: &'static str,
        timeout: Duration,
        fut: Fut,
    ) -> Result<T, FutureCoinError>
    where
        Fut: core::future::Future<Output = Result<T, FutureCoinError>>,
    {
        (tokio::time::timeout(timeout, fut).await)
            .unwrap_or_else(|_| Err(FutureCoinError::provider_timeout(connector_name, capability)))
    }

    /// Connectors ordered by symbol preference, then interval preference,
    /// then registration order.
    pub(crate) fn ordered(
        &self,
        symbol: Option<&Symbol>,
        interval: Option<IntervalClass>,
    ) -> Vec<Arc<dyn FutureCoinConnector>> {
        let mut out: Vec<(usize, Arc<dyn FutureCoinConnector>)> =
            self.connectors.iter().cloned().enumerate().collect();

        let pref = symbol
            .and_then(|s| self.cfg.per_symbol_priority.get(s))
            .or_else(|| interval.and_then(|i| self.cfg.per_interval_priority.get(&i)));
        if let Some(pref) = pref {
            let pos: HashMap<_, _> = pref
                .iter()
                .enumerate()
                .map(|(i, n)| (n.as_str(), i))
                .collect();
            out.sort_by_key(|(orig_i, c)| {
                (pos.get(c.name()).copied().unwrap_or(usize::MAX), *orig_i)
            });
        }
        out.into_iter().map(|(_, c)| c).collect()
    }

    /// Generic single-item fetch honoring the configured [`FetchStrategy`].
    ///
    /// `call` returns `None` for connectors lacking the capability. Errors
    /// aggregate as in [`collapse_errors`](crate::collapse_errors), with
    /// `NotFound` formatted as "{label} for {SYMBOL}".
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "futurecoin::core::fetch_single",
            skip(self, call),
            fields(symbol = %symbol, capability = %capability_label),
        )
    )]
    pub(crate) async fn fetch_single<T, F, Fut>(
        &self,
        symbol: &Symbol,
        interval: Option<IntervalClass>,
        capability_label: &'static str,
        not_found_label: &'static str,
        call: F,
    ) -> Result<(&'static str, T), FutureCoinError>
    where
        T: Send,
        F: Fn(Arc<dyn FutureCoinConnector>) -> Option<Fut> + Send,
        Fut: core::future::Future<Output = Result<T, FutureCoinError>> + Send,
    {
        let ordered = self.ordered(Some(symbol), interval);
        let not_found = || format!("{not_found_label} for {symbol}");
        match self.cfg.fetch_strategy {
            FetchStrategy::Latency => {
                self.fetch_single_latency(ordered, capability_label, not_found, call)
                    .await
            }
            _ => {
                self.fetch_single_priority_with_fallback(
                    ordered,
                    capability_label,
                    not_found,
                    call,
                )
                .await
            }
        }
    }

    async fn fetch_single_priority_with_fallback<T, F, Fut>(
        &self,
        ordered: Vec<Arc<dyn FutureCoinConnector>>,
        capability_label: &'static str,
        not_found: impl Fn() -> String,
        call: F,
    ) -> Result<(&'static str, T), FutureCoinError>
    where
        T: Send,
        F: Fn(Arc<dyn FutureCoinConnector>) -> Option<Fut> + Send,
        Fut: core::future::Future<Output = Result<T, FutureCoinError>> + Send,
    {
        let mut attempted_any = false;
        let mut errors: Vec<FutureCoinError> = Vec::new();

        for c in ordered {
            let name = c.name();
            let Some(fut) = call(c) else { continue };
            attempted_any = true;
            match Self::provider_call_with_timeout(
                name,
                capability_label,
                self.cfg.provider_timeout,
                fut,
            )
            .await
            {
                Ok(v) => return Ok((name, v)),
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(connector = name, error = %e, "provider failed; trying next");
                    errors.push(tag_err(name, e));
                }
            }
        }

        Err(crate::collapse_errors(
            capability_label,
            attempted_any,
            errors,
            Some(not_found()),
        ))
    }

    async fn fetch_single_latency<T, F, Fut>(
        &self,
        ordered: Vec<Arc<dyn FutureCoinConnector>>,
        capability_label: &'static str,
        not_found: impl Fn() -> String,
        call: F,
    ) -> Result<(&'static str, T), FutureCoinError>
    where
        T: Send,
        F: Fn(Arc<dyn FutureCoinConnector>) -> Option<Fut> + Send,
        Fut: core::future::Future<Output = Result<T, FutureCoinError>> + Send,
    {
        use futures::stream::{FuturesUnordered, StreamExt};

        let mut futs = FuturesUnordered::new();
        for c in ordered {
            let name = c.name();
            if let Some(fut) = call(c) {
                let timeout = self.cfg.provider_timeout;
                futs.push(async move {
                    (
                        name,
                        Self::provider_call_with_timeout(name, capability_label, timeout, fut)
                            .await,
                    )
                });
            }
        }
        let attempted_any = !futs.is_empty();

        let mut errors: Vec<FutureCoinError> = Vec::new();
        while let Some((name, res)) = futs.next().await {
            match res {
                Ok(v) => return Ok((name, v)),
                Err(e) => errors.push(tag_err(name, e)),
            }
        }

        Err(crate::collapse_errors(
            capability_label,
            attempted_any,
            errors,
            Some(not_found()),
        ))
    }
}

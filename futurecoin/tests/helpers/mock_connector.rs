#![allow(dead_code)]
#![allow(clippy::type_complexity)]
#![allow(clippy::missing_const_for_fn)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futurecoin_core::connector::{
    FutureCoinConnector, HistoryProvider, QuoteProvider, RateProvider,
};
use futurecoin_core::{
    Currency, Dataset, FutureCoinError, HistoryRequest, IntervalClass, RateRequest, RateTable,
    SpotPrice, Symbol,
};
use tokio::time::{Duration, sleep};

const DEFAULT_INTERVALS: &[IntervalClass] = &[IntervalClass::Daily, IntervalClass::Hourly];

type HistoryFn =
    Arc<dyn Fn(&Symbol, HistoryRequest) -> Result<Dataset, FutureCoinError> + Send + Sync>;
type QuoteFn = Arc<dyn Fn(&Symbol) -> Result<SpotPrice, FutureCoinError> + Send + Sync>;
type RatesFn = Arc<dyn Fn(RateRequest) -> Result<RateTable, FutureCoinError> + Send + Sync>;

/// Simple in-memory connector used by integration tests.
///
/// Capabilities are exposed only when the matching closure is set.
pub struct MockConnector {
    pub name: &'static str,
    pub delay_ms: u64,
    pub history_intervals: &'static [IntervalClass],
    pub native: Currency,
    pub max_lookback: u32,
    pub history_fn: Option<HistoryFn>,
    pub quote_fn: Option<QuoteFn>,
    pub rates_fn: Option<RatesFn>,
    pub calls: AtomicUsize,
    pub last_lookback: AtomicUsize,
}

impl MockConnector {
    pub fn builder() -> MockConnectorBuilder {
        MockConnectorBuilder::new()
    }

    /// Calls received across all capabilities.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }
}

#[async_trait]
impl HistoryProvider for MockConnector {
    async fn history(
        &self,
        symbol: &Symbol,
        req: HistoryRequest,
    ) -> Result<Dataset, FutureCoinError> {
        self.last_lookback
            .store(req.lookback as usize, Ordering::SeqCst);
        self.enter().await;
        match &self.history_fn {
            Some(f) => (f)(symbol, req),
            None => Err(FutureCoinError::unsupported("history")),
        }
    }

    fn supported_intervals(&self) -> &'static [IntervalClass] {
        self.history_intervals
    }

    fn native_currency(&self) -> Currency {
        self.native
    }

    fn max_lookback(&self, _interval: IntervalClass) -> u32 {
        self.max_lookback
    }
}

#[async_trait]
impl QuoteProvider for MockConnector {
    async fn spot_price(&self, symbol: &Symbol) -> Result<SpotPrice, FutureCoinError> {
        self.enter().await;
        match &self.quote_fn {
            Some(f) => (f)(symbol),
            None => Err(FutureCoinError::unsupported("quote")),
        }
    }
}

#[async_trait]
impl RateProvider for MockConnector {
    async fn exchange_rates(&self, req: RateRequest) -> Result<RateTable, FutureCoinError> {
        self.enter().await;
        match &self.rates_fn {
            Some(f) => (f)(req),
            None => Err(FutureCoinError::unsupported("exchange_rate")),
        }
    }

    fn supports_pair(&self, base: Currency, quote: Currency) -> bool {
        base == Currency::Usd && quote == Currency::Inr
    }
}

impl FutureCoinConnector for MockConnector {
    fn name(&self) -> &'static str {
        self.name
    }

    fn as_history_provider(&self) -> Option<&dyn HistoryProvider> {
        self.history_fn
            .as_ref()
            .map(|_| self as &dyn HistoryProvider)
    }

    fn as_quote_provider(&self) -> Option<&dyn QuoteProvider> {
        self.quote_fn.as_ref().map(|_| self as &dyn QuoteProvider)
    }

    fn as_rate_provider(&self) -> Option<&dyn RateProvider> {
        self.rates_fn.as_ref().map(|_| self as &dyn RateProvider)
    }
}

/* ---------- Tiny builder helpers used by tests ---------- */

pub struct MockConnectorBuilder {
    name: &'static str,
    delay_ms: u64,
    history_intervals: &'static [IntervalClass],
    native: Currency,
    max_lookback: u32,
    history_fn: Option<HistoryFn>,
    quote_fn: Option<QuoteFn>,
    rates_fn: Option<RatesFn>,
}

impl Default for MockConnectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnectorBuilder {
    pub fn new() -> Self {
        Self {
            name: "default_mock",
            delay_ms: 0,
            history_intervals: DEFAULT_INTERVALS,
            native: Currency::Usd,
            max_lookback: u32::MAX,
            history_fn: None,
            quote_fn: None,
            rates_fn: None,
        }
    }

    pub fn name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn delay(mut self, d: Duration) -> Self {
        self.delay_ms = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_history_intervals(mut self, intervals: &'static [IntervalClass]) -> Self {
        self.history_intervals = intervals;
        self
    }

    pub fn native_currency(mut self, c: Currency) -> Self {
        self.native = c;
        self
    }

    pub fn max_lookback(mut self, n: u32) -> Self {
        self.max_lookback = n;
        self
    }

    pub fn with_history_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Symbol, HistoryRequest) -> Result<Dataset, FutureCoinError> + Send + Sync + 'static,
    {
        self.history_fn = Some(Arc::new(f));
        self
    }

    /// Serve `ds` for every symbol, relabelled to the requested symbol.
    pub fn returns_history_ok(self, ds: Dataset) -> Self {
        self.with_history_fn(move |s, req| {
            let candles = ds
                .candles()
                .iter()
                .cloned()
                .map(|mut c| {
                    c.symbol = s.clone();
                    c
                })
                .collect();
            let full = Dataset::new(s.clone(), req.interval, ds.currency(), candles);
            let keep = full.len().saturating_sub(req.lookback as usize);
            Ok(Dataset::new(
                s.clone(),
                req.interval,
                ds.currency(),
                full.candles()[keep..].to_vec(),
            ))
        })
    }

    pub fn with_quote_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Symbol) -> Result<SpotPrice, FutureCoinError> + Send + Sync + 'static,
    {
        self.quote_fn = Some(Arc::new(f));
        self
    }

    pub fn returns_quote_ok(self, price: rust_decimal::Decimal) -> Self {
        self.with_quote_fn(move |s| {
            Ok(SpotPrice {
                symbol: s.clone(),
                price,
                currency: Currency::Usd,
                as_of: crate::helpers::dt(2024, 6, 30, 0),
            })
        })
    }

    pub fn with_rates_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(RateRequest) -> Result<RateTable, FutureCoinError> + Send + Sync + 'static,
    {
        self.rates_fn = Some(Arc::new(f));
        self
    }

    pub fn returns_rates_ok(self, table: RateTable) -> Self {
        self.with_rates_fn(move |_| Ok(table.clone()))
    }

    pub fn build(self) -> Arc<MockConnector> {
        Arc::new(MockConnector {
            name: self.name,
            delay_ms: self.delay_ms,
            history_intervals: self.history_intervals,
            native: self.native,
            max_lookback: self.max_lookback,
            history_fn: self.history_fn,
            quote_fn: self.quote_fn,
            rates_fn: self.rates_fn,
            calls: AtomicUsize::new(0),
            last_lookback: AtomicUsize::new(0),
        })
    }
}

/// Quote-only connector returning `price` USD for every symbol.
pub fn m_quote(name: &'static str, price: &str) -> Arc<MockConnector> {
    MockConnector::builder()
        .name(name)
        .returns_quote_ok(crate::helpers::dec(price))
        .build()
}

/// History-only connector serving `closes` for every symbol.
pub fn m_hist(name: &'static str, interval: IntervalClass, closes: &[&str]) -> Arc<MockConnector> {
    MockConnector::builder()
        .name(name)
        .returns_history_ok(crate::helpers::series("BTC", interval, closes))
        .build()
}

/// Rates-only connector serving a flat USD to INR table.
pub fn m_rates(name: &'static str, rate: &str) -> Arc<MockConnector> {
    MockConnector::builder()
        .name(name)
        .returns_rates_ok(crate::helpers::inr_table(rate, 90))
        .build()
}

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use futurecoin_core::connector::{
    FutureCoinConnector, HistoryProvider, QuoteProvider, RateProvider,
};
use futurecoin_core::{
    Currency, Dataset, FutureCoinError, HistoryRequest, IntervalClass, RateRequest, RateTable,
    SpotPrice, Symbol,
};

/// Instruction for how a method should behave for a given input.
#[derive(Clone)]
pub enum MockBehavior<T> {
    /// Return the provided value immediately.
    Return(T),
    /// Fail immediately with the provided error.
    Fail(FutureCoinError),
    /// Hang indefinitely (simulate a timeout).
    Hang,
}

#[derive(Default)]
struct InternalState {
    history_rules: HashMap<(Symbol, IntervalClass), MockBehavior<Dataset>>,
    quote_rules: HashMap<Symbol, MockBehavior<SpotPrice>>,
    rate_rule: Option<MockBehavior<RateTable>>,
}

/// Controller handle used by tests to drive the dynamic mock from the outside.
pub struct DynamicMockController {
    state: Arc<Mutex<InternalState>>,
    calls: Arc<AtomicUsize>,
}

impl DynamicMockController {
    /// Set the behavior for `history` calls for a symbol and interval class.
    pub async fn set_history_behavior(
        &self,
        symbol: Symbol,
        interval: IntervalClass,
        behavior: MockBehavior<Dataset>,
    ) {
        let mut guard = self.state.lock().await;
        guard.history_rules.insert((symbol, interval), behavior);
    }

    /// Set the behavior for `spot_price` calls for a symbol.
    pub async fn set_quote_behavior(&self, symbol: Symbol, behavior: MockBehavior<SpotPrice>) {
        let mut guard = self.state.lock().await;
        guard.quote_rules.insert(symbol, behavior);
    }

    /// Set the behavior for every `exchange_rates` call.
    pub async fn set_rate_behavior(&self, behavior: MockBehavior<RateTable>) {
        let mut guard = self.state.lock().await;
        guard.rate_rule = Some(behavior);
    }

    /// Number of provider calls received so far, across all capabilities.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Clear all configured behaviors.
    pub async fn clear_all_behaviors(&self) {
        let mut guard = self.state.lock().await;
        guard.history_rules.clear();
        guard.quote_rules.clear();
        guard.rate_rule = None;
    }
}

/// A connector that defers all behavior to an external controller.
///
/// Calls without a configured rule fail with `Unsupported`.
pub struct DynamicMockConnector {
    name: &'static str,
    state: Arc<Mutex<InternalState>>,
    calls: Arc<AtomicUsize>,
}

impl DynamicMockConnector {
    /// Create a new dynamic mock connector and its controller.
    #[must_use]
    pub fn new_with_controller(
        name: &'static str,
    ) -> (Arc<dyn FutureCoinConnector>, DynamicMockController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let calls = Arc::new(AtomicUsize::new(0));
        let controller = DynamicMockController {
            state: Arc::clone(&state),
            calls: Arc::clone(&calls),
        };
        let me = Arc::new(Self { name, state, calls });
        (me as Arc<dyn FutureCoinConnector>, controller)
    }

    async fn resolve<T>(behavior: Option<MockBehavior<T>>, capability: &str) -> Result<T, FutureCoinError> {
        match behavior {
            Some(MockBehavior::Return(v)) => Ok(v),
            Some(MockBehavior::Fail(e)) => Err(e),
            Some(MockBehavior::Hang) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            None => Err(FutureCoinError::unsupported(capability)),
        }
    }
}

impl FutureCoinConnector for DynamicMockConnector {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "DynamicMock"
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

#[async_trait]
impl HistoryProvider for DynamicMockConnector {
    async fn history(
        &self,
        symbol: &Symbol,
        req: HistoryRequest,
    ) -> Result<Dataset, FutureCoinError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Snapshot the rule without holding the lock across await points
        let behavior = {
            let guard = self.state.lock().await;
            guard
                .history_rules
                .get(&(symbol.clone(), req.interval))
                .cloned()
        };
        Self::resolve(behavior, "history").await
    }

    fn supported_intervals(&self) -> &'static [IntervalClass] {
        &[IntervalClass::Daily, IntervalClass::Hourly]
    }
}

#[async_trait]
impl QuoteProvider for DynamicMockConnector {
    async fn spot_price(&self, symbol: &Symbol) -> Result<SpotPrice, FutureCoinError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = {
            let guard = self.state.lock().await;
            guard.quote_rules.get(symbol).cloned()
        };
        Self::resolve(behavior, "quote").await
    }
}

#[async_trait]
impl RateProvider for DynamicMockConnector {
    async fn exchange_rates(&self, _req: RateRequest) -> Result<RateTable, FutureCoinError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = {
            let guard = self.state.lock().await;
            guard.rate_rule.clone()
        };
        Self::resolve(behavior, "exchange-rate").await
    }

    fn supports_pair(&self, base: Currency, quote: Currency) -> bool {
        base == Currency::Usd && quote == Currency::Inr
    }
}

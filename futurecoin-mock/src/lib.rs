//! Mock connectors for tests and local runs.
//!
//! - [`MockConnector`] serves deterministic fixtures for BTC, ETH, SOL and ADA
//!   (history in USD, spot prices, USD to INR rates).
//! - [`DynamicMockConnector`] defers every call to rules set through a
//!   [`DynamicMockController`].
use async_trait::async_trait;
use futurecoin_core::connector::{
    FutureCoinConnector, HistoryProvider, QuoteProvider, RateProvider,
};
use futurecoin_core::{
    Currency, Dataset, FutureCoinError, HistoryRequest, IntervalClass, RateRequest, RateTable,
    SpotPrice, Symbol,
};

mod dynamic;
mod fixtures;

pub use dynamic::{DynamicMockConnector, DynamicMockController, MockBehavior};
pub use fixtures::history::{SERIES_LEN, series_end};

/// Mock connector backed by static fixtures.
///
/// The symbols `FAIL` and `TIMEOUT` trigger a connector error and a short
/// delay respectively, for every capability.
pub struct MockConnector;

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnector {
    /// Connector name used in priority lists.
    pub const NAME: &'static str = "futurecoin-mock";

    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    async fn maybe_fail_or_timeout(
        symbol: &Symbol,
        capability: &'static str,
    ) -> Result<(), FutureCoinError> {
        match symbol.as_str() {
            "FAIL" => Err(FutureCoinError::connector(
                Self::NAME,
                format!("forced failure: {capability}"),
            )),
            "TIMEOUT" => {
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl FutureCoinConnector for MockConnector {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn vendor(&self) -> &'static str {
        "Mock"
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
impl HistoryProvider for MockConnector {
    async fn history(
        &self,
        symbol: &Symbol,
        req: HistoryRequest,
    ) -> Result<Dataset, FutureCoinError> {
        Self::maybe_fail_or_timeout(symbol, "history").await?;
        fixtures::history::by_symbol(symbol, req)
            .ok_or_else(|| FutureCoinError::not_found(format!("history for {symbol}")))
    }

    fn supported_intervals(&self) -> &'static [IntervalClass] {
        fixtures::history::INTERVALS
    }
}

#[async_trait]
impl QuoteProvider for MockConnector {
    async fn spot_price(&self, symbol: &Symbol) -> Result<SpotPrice, FutureCoinError> {
        Self::maybe_fail_or_timeout(symbol, "quote").await?;
        fixtures::quotes::by_symbol(symbol)
            .ok_or_else(|| FutureCoinError::not_found(format!("quote for {symbol}")))
    }
}

#[async_trait]
impl RateProvider for MockConnector {
    async fn exchange_rates(&self, req: RateRequest) -> Result<RateTable, FutureCoinError> {
        fixtures::rates::usd_inr(req).ok_or_else(|| {
            FutureCoinError::not_found(format!("{} to {} rates", req.base, req.quote))
        })
    }

    fn supports_pair(&self, base: Currency, quote: Currency) -> bool {
        base == Currency::Usd && quote == Currency::Inr
    }
}

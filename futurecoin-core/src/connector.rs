use async_trait::async_trait;

use crate::types::{HistoryRequest, RateRequest, SpotPrice};
pub use futurecoin_types::ConnectorKey;
use futurecoin_types::{Currency, Dataset, FutureCoinError, IntervalClass, RateTable, Symbol};

/// Focused role trait for connectors that provide OHLCV history.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Fetch the most recent `req.lookback` candles for `symbol`.
    ///
    /// The returned dataset is quoted in the provider's native currency
    /// (see [`HistoryProvider::native_currency`]).
    async fn history(
        &self,
        symbol: &Symbol,
        req: HistoryRequest,
    ) -> Result<Dataset, FutureCoinError>;

    /// REQUIRED: interval classes this connector can natively serve.
    fn supported_intervals(&self) -> &'static [IntervalClass];

    /// Currency the provider quotes history in.
    fn native_currency(&self) -> Currency {
        Currency::Usd
    }

    /// Largest lookback the provider accepts for an interval class.
    fn max_lookback(&self, interval: IntervalClass) -> u32 {
        let _ = interval;
        u32::MAX
    }
}

/// Focused role trait for connectors that provide a current spot price.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetch the latest traded price for `symbol`.
    async fn spot_price(&self, symbol: &Symbol) -> Result<SpotPrice, FutureCoinError>;
}

/// Focused role trait for connectors that provide historical exchange rates.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Fetch daily rates for the requested pair and window.
    async fn exchange_rates(&self, req: RateRequest) -> Result<RateTable, FutureCoinError>;

    /// Whether the connector can serve the `base -> quote` pair.
    fn supports_pair(&self, base: Currency, quote: Currency) -> bool;
}

/// Main connector trait implemented by every data provider.
///
/// A connector advertises each capability by returning a trait object from
/// the matching `as_*_provider` accessor; the orchestrator skips connectors
/// that return `None`.
pub trait FutureCoinConnector: Send + Sync {
    /// A stable identifier for priority lists (e.g., "futurecoin-yahoo").
    fn name(&self) -> &'static str;

    /// Canonical connector key constructed from the static name.
    fn key(&self) -> ConnectorKey {
        ConnectorKey::new(self.name())
    }

    /// Human-friendly vendor string.
    fn vendor(&self) -> &'static str {
        "unknown"
    }

    /// Advertise history capability.
    fn as_history_provider(&self) -> Option<&dyn HistoryProvider> {
        None
    }

    /// Advertise spot price capability.
    fn as_quote_provider(&self) -> Option<&dyn QuoteProvider> {
        None
    }

    /// Advertise exchange rate capability.
    fn as_rate_provider(&self) -> Option<&dyn RateProvider> {
        None
    }
}

/// Generate `as_*_provider` accessors for a wrapper that implements
/// `FutureCoinConnector` by delegating to an inner field.
///
/// The wrapper must itself implement every role trait.
#[macro_export]
macro_rules! futurecoin_connector_accessors {
    ($inner:ident) => {
        fn as_history_provider(&self) -> Option<&dyn $crate::connector::HistoryProvider> {
            if self.$inner.as_history_provider().is_some() {
                Some(self as &dyn $crate::connector::HistoryProvider)
            } else {
                None
            }
        }
        fn as_quote_provider(&self) -> Option<&dyn $crate::connector::QuoteProvider> {
            if self.$inner.as_quote_provider().is_some() {
                Some(self as &dyn $crate::connector::QuoteProvider)
            } else {
                None
            }
        }
        fn as_rate_provider(&self) -> Option<&dyn $crate::connector::RateProvider> {
            if self.$inner.as_rate_provider().is_some() {
                Some(self as &dyn $crate::connector::RateProvider)
            } else {
                None
            }
        }
    };
}

use std::sync::Arc;
use std::time::Duration;

use futurecoin_core::BackoffConfig;
use futurecoin_core::connector::FutureCoinConnector;
use futurecoin_middleware::{CacheConfig, ConnectorBuilder as GenericConnectorBuilder};

use crate::YahooConnector;

/// Builder type alias specialized for Yahoo connectors.
pub type YahooConnectorBuilder = GenericConnectorBuilder;

impl YahooConnector {
    /// Returns an unconfigured builder wrapping this connector.
    ///
    /// Customize with the builder methods before calling `.build()`.
    #[must_use]
    pub fn builder(self) -> YahooConnectorBuilder {
        let raw: Arc<dyn FutureCoinConnector> = Arc::new(self);
        GenericConnectorBuilder::new(raw)
    }

    /// Returns a builder tuned for the public endpoint: three retries with
    /// backoff, a five minute blacklist after a rate-limit response, and
    /// cached history and exchange rates.
    ///
    /// Users can further customize before calling `.build()`.
    #[must_use]
    pub fn rate_limited(self) -> YahooConnectorBuilder {
        self.builder()
            .with_retry(3, BackoffConfig::default())
            .with_cache(CacheConfig::default())
            .with_blacklist(Duration::from_secs(5 * 60))
    }
}

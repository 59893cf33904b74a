use std::sync::Arc;
use std::time::Duration;

use futurecoin_core::BackoffConfig;
use futurecoin_core::connector::FutureCoinConnector;
use futurecoin_middleware::{CacheConfig, ConnectorBuilder as GenericConnectorBuilder};

use crate::BinanceConnector;

/// Builder type alias specialized for Binance connectors.
pub type BinanceConnectorBuilder = GenericConnectorBuilder;

impl BinanceConnector {
    /// Returns an unconfigured builder wrapping this connector.
    ///
    /// Customize with the builder methods before calling `.build()`.
    #[must_use]
    pub fn builder(self) -> BinanceConnectorBuilder {
        let raw: Arc<dyn FutureCoinConnector> = Arc::new(self);
        GenericConnectorBuilder::new(raw)
    }

    /// Returns a builder for the public endpoint: two retries, a two minute
    /// blacklist after 429/418, cached klines and ten-second cached prices.
    #[must_use]
    pub fn rate_limited(self) -> BinanceConnectorBuilder {
        let cache = CacheConfig {
            quote_ttl: Some(Duration::from_secs(10)),
            ..CacheConfig::default()
        };
        self.builder()
            .with_retry(2, BackoffConfig::default())
            .with_cache(cache)
            .with_blacklist(Duration::from_secs(2 * 60))
    }
}

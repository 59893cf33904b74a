use std::sync::Arc;
use std::time::Duration;

use futurecoin_core::BackoffConfig;
use futurecoin_core::connector::FutureCoinConnector;
use futurecoin_middleware::{CacheConfig, ConnectorBuilder as GenericConnectorBuilder};

use crate::CryptoCompareConnector;

/// Builder type alias specialized for CryptoCompare connectors.
pub type CryptoCompareConnectorBuilder = GenericConnectorBuilder;

impl CryptoCompareConnector {
    /// Returns an unconfigured builder wrapping this connector.
    #[must_use]
    pub fn builder(self) -> CryptoCompareConnectorBuilder {
        let raw: Arc<dyn FutureCoinConnector> = Arc::new(self);
        GenericConnectorBuilder::new(raw)
    }

    /// Returns a builder for the free tier: three retries with backoff, a
    /// one hour blacklist once the monthly or hourly quota is exhausted, and
    /// cached history.
    #[must_use]
    pub fn rate_limited(self) -> CryptoCompareConnectorBuilder {
        let cache = CacheConfig {
            history_ttl: Some(Duration::from_secs(15 * 60)),
            ..CacheConfig::default()
        };
        self.builder()
            .with_retry(3, BackoffConfig::default())
            .with_cache(cache)
            .with_blacklist(Duration::from_secs(60 * 60))
    }
}

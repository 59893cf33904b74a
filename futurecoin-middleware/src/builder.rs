//! Builder for composing connectors with middleware layers.
//!
//! Layers form an onion around the raw connector. The `layers` vector stores
//! them outermost first (last added is outermost) and `build()` applies them
//! in reverse:
//!
//! ```text
//! builder.with_retry(..).with_blacklist(..)
//!
//! Storage: [Blacklist, Retry]
//! Applied:  Raw -> Retry -> Blacklist
//! Result:   Blacklist(Retry(Raw))
//! ```

use std::sync::Arc;
use std::time::Duration;

use futurecoin_core::connector::FutureCoinConnector;
use futurecoin_core::{BackoffConfig, Middleware};

use crate::blacklist::BlacklistMiddleware;
use crate::cache::{CacheConfig, CacheMiddleware};
use crate::retry::RetryMiddleware;

/// Generic middleware builder for composing a connector with layered wrappers.
pub struct ConnectorBuilder {
    raw: Arc<dyn FutureCoinConnector>,
    /// Middleware layers in outermost-first order.
    layers: Vec<Box<dyn Middleware>>,
}

impl ConnectorBuilder {
    /// Create a new builder from a raw, unwrapped connector.
    #[must_use]
    pub fn new(raw: Arc<dyn FutureCoinConnector>) -> Self {
        Self {
            raw,
            layers: Vec::new(),
        }
    }

    fn replace(mut self, layer: Box<dyn Middleware>) -> Self {
        let name = layer.name();
        self.layers.retain(|m| m.name() != name);
        self.layers.insert(0, layer);
        self
    }

    /// Add or replace the retry layer at the outermost position.
    #[must_use]
    pub fn with_retry(self, attempts: u32, backoff: BackoffConfig) -> Self {
        self.replace(Box::new(RetryMiddleware::new(attempts, backoff)))
    }

    /// Add or replace the blacklist layer at the outermost position.
    #[must_use]
    pub fn with_blacklist(self, duration: Duration) -> Self {
        self.replace(Box::new(BlacklistMiddleware::new(duration)))
    }

    /// Add or replace the cache layer at the outermost position.
    #[must_use]
    pub fn with_cache(self, cfg: CacheConfig) -> Self {
        self.replace(Box::new(CacheMiddleware::new(cfg)))
    }

    /// Add an arbitrary middleware layer at the outermost position.
    #[must_use]
    pub fn layer(mut self, layer: Box<dyn Middleware>) -> Self {
        self.layers.insert(0, layer);
        self
    }

    /// Layer names and configuration, outermost first, ending with the raw connector.
    #[must_use]
    pub fn describe(&self) -> Vec<(&'static str, serde_json::Value)> {
        let mut out: Vec<_> = self
            .layers
            .iter()
            .map(|l| (l.name(), l.config_json()))
            .collect();
        out.push((
            "RawConnector",
            serde_json::json!({ "name": self.raw.name() }),
        ));
        out
    }

    /// Build the wrapped connector, applying layers innermost first.
    #[must_use]
    pub fn build(self) -> Arc<dyn FutureCoinConnector> {
        let mut acc: Arc<dyn FutureCoinConnector> = Arc::clone(&self.raw);
        for m in self.layers.into_iter().rev() {
            acc = m.apply(acc);
        }
        acc
    }
}

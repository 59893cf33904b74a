//! futurecoin-middleware
//!
//! Connector wrappers composed through [`ConnectorBuilder`]:
//!
//! - [`RetryingConnector`] retries transient provider failures with
//!   exponential backoff and jitter.
//! - [`BlacklistingMiddleware`] takes a rate-limited provider out of rotation
//!   for a while.
//! - [`CachingConnector`] keeps recent history and exchange-rate responses in a
//!   TTL cache.

mod blacklist;
mod builder;
mod cache;
mod retry;

pub use crate::blacklist::{BlacklistMiddleware, BlacklistingMiddleware};
pub use crate::builder::ConnectorBuilder;
pub use crate::cache::{CacheConfig, CacheMiddleware, CachingConnector};
pub use crate::retry::{RetryMiddleware, RetryingConnector};

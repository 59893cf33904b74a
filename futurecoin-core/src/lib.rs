//! futurecoin-core
//!
//! Connector traits, time-series utilities, storage and estimators shared
//! across the FutureCoin workspace.
//!
//! - `connector`: the `FutureCoinConnector` trait and its role traits.
//! - `timeseries`: validate, merge and currency-normalize datasets.
//! - `storage`: CSV persistence keyed by symbol and interval class.
//! - `model`: trained sequence models and their registry.
//! - `estimator`: deterministic fallback estimators.
//! - `evaluate`: accuracy of predictions against realized prices.
#![warn(missing_docs)]

/// Connector capability traits and the primary `FutureCoinConnector` interface.
pub mod connector;
/// Accuracy metrics for past predictions.
pub mod evaluate;
/// Fallback estimators.
pub mod estimator;
/// Middleware trait implemented by connector wrappers.
pub mod middleware;
/// Sequence models and the model registry.
pub mod model;
/// CSV dataset store.
pub mod storage;
/// Time-series utilities for validation, merging and normalization.
pub mod timeseries;
pub mod types;

pub use connector::{FutureCoinConnector, HistoryProvider, QuoteProvider, RateProvider};
pub use estimator::{
    Estimate, FallbackEstimator, FallbackInput, LastValue, LinearTrend, SeededNoise, estimator_for,
};
pub use evaluate::{evaluate_accuracy, mean_accuracy};
pub use middleware::Middleware;
pub use model::{
    LinearSequenceModel, ModelEntry, ModelRegistry, RegistryStatus, SequenceModel, model_key,
};
pub use storage::DatasetStore;
pub use timeseries::merge::{merge_candles_by_priority, merge_datasets};
pub use timeseries::normalize::{
    Normalized, convert_dataset, convert_price, normalize_dataset, retag_pegged,
};
pub use timeseries::validate::{partition_valid, sanitize_dataset};
pub use types::*;

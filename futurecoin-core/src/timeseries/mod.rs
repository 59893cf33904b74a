//! Time-series utilities shared by connectors, the store and the orchestrator.
//!
//! - `validate`: drop candles that violate OHLCV invariants
//! - `merge`: combine series and datasets with first-wins de-duplication
//! - `normalize`: convert USD series into another currency
/// Merge utilities for joining series and datasets.
pub mod merge;
/// Currency conversion of datasets.
pub mod normalize;
/// Row-level invariant checks.
pub mod validate;

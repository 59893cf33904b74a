//! FutureCoin orchestrates crypto market data providers and serves price predictions.
//!
//! Overview
//! - Routes history, spot-price and exchange-rate requests to connectors that
//!   implement the `futurecoin_core` role traits.
//! - Applies per-symbol and per-interval priorities to influence provider order.
//! - Normalizes USD-denominated candles into configured output currencies.
//! - Persists and merges multi-symbol datasets through the bulk download builder.
//! - Produces daily and hourly point estimates from trained models, degrading to
//!   a deterministic fallback estimator when no model can serve a request.
//!
//! Key behaviors and trade-offs
//! - Fetch strategy:
//!   - `PriorityWithFallback`: deterministic order, per-provider timeout, aggregates
//!     errors; fewer concurrent requests but potentially higher latency.
//!   - `Latency`: races eligible providers; lowest tail latency but higher request fanout.
//! - Conflicts: the first successful non-empty dataset wins. Lower-priority
//!   providers are never consulted once a higher one answers.
//! - Currency: candles without an applicable exchange rate are dropped and
//!   counted, never filled with a guessed rate.
//! - Predictions: validation happens before any provider access; a missing or
//!   failing model never fails a request.
//!
//! Examples
//! Building an orchestrator with preferences:
//! ```rust,ignore
//! use std::sync::Arc;
//! use futurecoin::{FutureCoin, FetchStrategy, IntervalClass};
//!
//! let yahoo = Arc::new(YahooConnector::new_default()?);
//! let binance = Arc::new(BinanceConnector::new_default()?);
//!
//! let fc = FutureCoin::builder()
//!     .with_connector(yahoo.clone())
//!     .with_connector(binance.clone())
//!     .prefer_for_interval(IntervalClass::Hourly, &[binance, yahoo])
//!     .fetch_strategy(FetchStrategy::PriorityWithFallback)
//!     .build()?;
//! ```
//!
//! Predicting:
//! ```rust,ignore
//! use futurecoin::{PredictionRequest, Symbol};
//!
//! let req = PredictionRequest::new(Symbol::new("BTC")?, 1, 6);
//! let res = fc.predict(req).await?;
//! if let Some(daily) = res.daily_prediction {
//!     println!("{} {}", daily.predicted_price, daily.currency);
//! }
//! ```
//!
//! Bulk download into a CSV store:
//! ```rust,ignore
//! use futurecoin::{Currency, DatasetStore, IntervalClass, Symbol};
//!
//! let report = fc
//!     .download()
//!     .symbols(&[Symbol::new("BTC")?, Symbol::new("ETH")?])?
//!     .interval(IntervalClass::Daily)
//!     .target_currency(Currency::Inr)
//!     .store(DatasetStore::new("data"))
//!     .run()
//!     .await?;
//! println!("{} files, {} warnings", report.files.len(), report.warnings.len());
//! ```
#![warn(missing_docs)]

pub(crate) mod core;
mod router;

pub use crate::core::{FutureCoin, FutureCoinBuilder, tag_err};
pub use router::download::DownloadBuilder;
pub use router::util::{collapse_errors, join_with_deadline};

pub use futurecoin_middleware::{
    BlacklistMiddleware, CacheConfig, CacheMiddleware, ConnectorBuilder, RetryMiddleware,
};

// Re-export core types for convenience
pub use futurecoin_core::{
    AccuracyMetrics, Attribution, BackoffConfig, Candle, Capability, Currency, CurrencyPolicy,
    Dataset, DatasetStore, DownloadReport, ExchangeRateSample, FallbackEstimator, FallbackKind,
    FetchStrategy, FutureCoinConfig, FutureCoinConnector, FutureCoinError, HistoryRequest,
    Horizon, HorizonError, HorizonPrediction, IntervalClass, Limits, LinearSequenceModel, MergedDataset,
    ModelRegistry, PredictionRequest, PredictionResult, RateRequest, RateTable, SequenceModel,
    Span, SpotPrice, Symbol, evaluate_accuracy,
};

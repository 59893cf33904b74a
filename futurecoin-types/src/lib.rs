//! FutureCoin domain types, errors and configuration primitives.
#![warn(missing_docs)]

mod attribution;
mod candle;
mod capability;
mod config;
mod connector;
mod error;
mod market;
mod prediction;
mod rates;
mod reports;

pub use attribution::{Attribution, Span};
pub use candle::{Candle, Dataset, MergedDataset};
pub use capability::Capability;
pub use config::{
    BackoffConfig, CurrencyPolicy, DEFAULT_SYMBOLS, FallbackKind, FetchStrategy,
    FutureCoinConfig, Limits,
};
pub use connector::ConnectorKey;
pub use error::FutureCoinError;
pub use market::{Currency, IntervalClass, Symbol};
pub use prediction::{
    AccuracyMetrics, Horizon, HorizonError, HorizonPrediction, PredictionRequest, PredictionResult,
};
pub use rates::{ExchangeRateSample, RateTable};
pub use reports::DownloadReport;

//! Configuration types shared across the orchestrator, connectors and server.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::connector::ConnectorKey;
use crate::market::{Currency, IntervalClass, Symbol};

/// Strategy for selecting among eligible data providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum FetchStrategy {
    /// Use priority order and fall back to the next provider on failure.
    #[default]
    PriorityWithFallback,
    /// Race all eligible providers concurrently and return the first success.
    Latency,
}

/// Estimator used when no trained model can serve a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FallbackKind {
    /// Bounded trend and volatility draws from a deterministic seeded generator.
    SeededNoise {
        /// Base seed combined with symbol, interval and horizon.
        seed: u64,
    },
    /// Predict the basis price unchanged.
    LastValue,
    /// Extrapolate a least-squares line fitted to recent closes.
    LinearTrend,
}

impl Default for FallbackKind {
    fn default() -> Self {
        Self::SeededNoise { seed: 0 }
    }
}

/// Exponential backoff configuration for retried provider calls.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Minimum backoff delay in milliseconds.
    pub min_backoff_ms: u64,
    /// Maximum backoff delay in milliseconds.
    pub max_backoff_ms: u64,
    /// Exponential factor to increase delay after each failure (>= 1).
    pub factor: u32,
    /// Random jitter percentage [0, 100] added to each delay.
    pub jitter_percent: u8,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_backoff_ms: 500,
            max_backoff_ms: 30_000,
            factor: 2,
            jitter_percent: 20,
        }
    }
}

/// Lookback and horizon bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum daily candles fetched per request.
    pub max_daily_lookback: u32,
    /// Maximum hourly candles fetched per request.
    pub max_hourly_lookback: u32,
    /// Largest accepted `days_ahead`.
    pub max_days_ahead: u32,
    /// Largest accepted `hours_ahead`.
    pub max_hours_ahead: u32,
}

impl Limits {
    /// Lookback maximum for an interval class.
    #[must_use]
    pub const fn max_lookback(&self, interval: IntervalClass) -> u32 {
        match interval {
            IntervalClass::Daily => self.max_daily_lookback,
            IntervalClass::Hourly => self.max_hourly_lookback,
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_daily_lookback: 60,
            max_hourly_lookback: 60,
            max_days_ahead: 30,
            max_hours_ahead: 23,
        }
    }
}

/// Output currency per interval class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyPolicy {
    /// Currency of daily datasets and predictions.
    pub daily: Currency,
    /// Currency of hourly datasets and predictions.
    pub hourly: Currency,
}

impl CurrencyPolicy {
    /// Output currency for an interval class.
    #[must_use]
    pub const fn for_interval(&self, interval: IntervalClass) -> Currency {
        match interval {
            IntervalClass::Daily => self.daily,
            IntervalClass::Hourly => self.hourly,
        }
    }
}

impl Default for CurrencyPolicy {
    fn default() -> Self {
        Self {
            daily: Currency::Inr,
            hourly: Currency::Usdt,
        }
    }
}

/// Symbols served when no explicit list is configured.
pub const DEFAULT_SYMBOLS: [&str; 9] = [
    "BTC", "ETH", "ADA", "BNB", "XRP", "SOL", "DOGE", "LTC", "MATIC",
];

/// Global configuration for the `FutureCoin` orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FutureCoinConfig {
    /// Preferred connector order per interval class.
    #[serde(skip)]
    pub per_interval_priority: HashMap<IntervalClass, Vec<ConnectorKey>>,
    /// Preferred connector order per symbol; overrides interval preferences.
    #[serde(skip)]
    pub per_symbol_priority: HashMap<Symbol, Vec<ConnectorKey>>,
    /// Strategy for fetching from multiple providers.
    pub fetch_strategy: FetchStrategy,
    /// Timeout for individual provider requests.
    pub provider_timeout: Duration,
    /// Optional overall deadline for fan-out operations (bulk download).
    pub request_timeout: Option<Duration>,
    /// Lookback and horizon bounds.
    pub limits: Limits,
    /// Output currency per interval class.
    pub currencies: CurrencyPolicy,
    /// Symbols accepted by fetch and predict operations.
    pub supported_symbols: Vec<Symbol>,
    /// Estimator used when no model is available.
    pub fallback: FallbackKind,
}

impl FutureCoinConfig {
    /// True when `symbol` is in the supported set.
    #[must_use]
    pub fn supports(&self, symbol: &Symbol) -> bool {
        self.supported_symbols.contains(symbol)
    }
}

impl Default for FutureCoinConfig {
    fn default() -> Self {
        Self {
            per_interval_priority: HashMap::new(),
            per_symbol_priority: HashMap::new(),
            fetch_strategy: FetchStrategy::default(),
            provider_timeout: Duration::from_secs(10),
            request_timeout: None,
            limits: Limits::default(),
            currencies: CurrencyPolicy::default(),
            supported_symbols: DEFAULT_SYMBOLS
                .iter()
                .filter_map(|s| Symbol::new(s).ok())
                .collect(),
            fallback: FallbackKind::default(),
        }
    }
}

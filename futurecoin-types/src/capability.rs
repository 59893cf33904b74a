use core::fmt;
use serde::{Deserialize, Serialize};

/// High-level capability labels for routing, errors, and telemetry.
///
/// These map one-to-one with router endpoints and keep error and log labels
/// consistent across crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Capability {
    /// Current spot price for a single asset.
    Quote,
    /// Historical OHLCV candles.
    History,
    /// Historical exchange rates between two currencies.
    ExchangeRate,
    /// Bulk download of history across assets.
    DownloadHistory,
    /// Point estimates for a future horizon.
    Predict,
    /// Trained model resolution.
    ModelLookup,
}

impl Capability {
    /// Stable, kebab-case identifier for logs/errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::History => "history",
            Self::ExchangeRate => "exchange-rate",
            Self::DownloadHistory => "download:history",
            Self::Predict => "predict",
            Self::ModelLookup => "model-lookup",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the futurecoin workspace.
///
/// Covers request validation, provider-tagged failures (including rate limits
/// and timeouts), integrity problems with fetched rows, model resolution and
/// local storage, plus an aggregate for multi-provider attempts.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FutureCoinError {
    /// The requested capability is not implemented by the target connector.
    #[error("unsupported capability: {capability}")]
    Unsupported {
        /// A capability string describing what was requested (e.g. "history/hourly").
        capability: String,
    },

    /// The request shape or range is invalid and can be fixed by the caller.
    #[error("{code}: {message}")]
    Validation {
        /// Stable machine-readable code, e.g. `empty_horizon`.
        code: String,
        /// Human-readable explanation.
        message: String,
    },

    /// A fetched row is malformed or violates OHLCV invariants.
    #[error("data integrity: {0}")]
    DataIntegrity(String),

    /// Invalid input argument passed to a library API.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// An individual connector returned an error.
    #[error("{connector} failed: {msg}")]
    Connector {
        /// Connector name that failed.
        connector: String,
        /// Human-readable error message.
        msg: String,
    },

    /// An upstream provider rejected the call because of rate limiting.
    #[error("{connector} rate limited")]
    RateLimited {
        /// Connector name that was throttled.
        connector: String,
        /// Server-suggested delay before retrying, when known.
        retry_after_ms: Option<u64>,
    },

    /// Unknown/opaque error.
    #[error("unknown error: {0}")]
    Other(String),

    /// A resource or symbol could not be found.
    #[error("not found: {what}")]
    NotFound {
        /// Description of missing resource, e.g. "quote for BTC".
        what: String,
    },

    /// All selected providers failed; contains the individual failures.
    #[error("all providers failed: {0:?}")]
    AllProvidersFailed(Vec<FutureCoinError>),

    /// An individual provider call exceeded the configured timeout.
    #[error("provider timed out: {capability} via {connector}")]
    ProviderTimeout {
        /// Connector name that timed out.
        connector: String,
        /// Capability label (e.g. "history", "quote").
        capability: String,
    },

    /// The overall request exceeded the configured deadline.
    #[error("request timed out: {capability}")]
    RequestTimeout {
        /// Capability label for which the request timed out.
        capability: String,
    },

    /// All attempted providers timed out for the requested capability.
    #[error("all providers timed out: {capability}")]
    AllProvidersTimedOut {
        /// Capability label that timed out across all providers.
        capability: String,
    },

    /// Connector is temporarily blacklisted by middleware; retry after `reset_in_ms`.
    #[error("temporarily blacklisted: reset_in_ms={reset_in_ms}")]
    TemporarilyBlacklisted {
        /// Milliseconds remaining until the blacklist window elapses.
        reset_in_ms: u64,
    },

    /// No trained model could be resolved for a symbol and interval.
    #[error("model unavailable: {key}: {reason}")]
    ModelUnavailable {
        /// Registry key of the missing model, e.g. `lstm_btc_daily`.
        key: String,
        /// Why resolution failed.
        reason: String,
    },

    /// Reading or writing a dataset file failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl FutureCoinError {
    /// Helper: build an `Unsupported` error for a capability string.
    #[must_use]
    pub fn unsupported(cap: impl Into<String>) -> Self {
        Self::Unsupported {
            capability: cap.into(),
        }
    }

    /// Helper: build a `Validation` error with a stable code.
    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Helper: build a `Connector` error with the connector name and message.
    pub fn connector(connector: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Connector {
            connector: connector.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `NotFound` error for a description of the missing resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Helper: build a `ProviderTimeout` error.
    pub fn provider_timeout(connector: impl Into<String>, capability: impl Into<String>) -> Self {
        Self::ProviderTimeout {
            connector: connector.into(),
            capability: capability.into(),
        }
    }

    /// Helper: build a `RequestTimeout` error.
    #[must_use]
    pub fn request_timeout(capability: impl Into<String>) -> Self {
        Self::RequestTimeout {
            capability: capability.into(),
        }
    }

    /// Helper: build a `ModelUnavailable` error.
    pub fn model_unavailable(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Stable snake_case code used in HTTP error bodies and logs.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Unsupported { .. } => "unsupported",
            Self::Validation { code, .. } => code,
            Self::DataIntegrity(_) => "data_integrity",
            Self::InvalidArg(_) => "invalid_argument",
            Self::Connector { .. } => "provider_error",
            Self::RateLimited { .. } => "rate_limited",
            Self::Other(_) => "internal",
            Self::NotFound { .. } => "not_found",
            Self::AllProvidersFailed(_) => "all_providers_failed",
            Self::ProviderTimeout { .. } => "provider_timeout",
            Self::RequestTimeout { .. } => "request_timeout",
            Self::AllProvidersTimedOut { .. } => "all_providers_timed_out",
            Self::TemporarilyBlacklisted { .. } => "temporarily_blacklisted",
            Self::ModelUnavailable { .. } => "model_unavailable",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
        }
    }

    /// Returns true if this error should be surfaced to users as actionable.
    ///
    /// Non-actionable errors are those indicating capability absence or a benign
    /// not-found condition. Aggregates are classified based on their contents.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        match self {
            Self::Unsupported { .. } | Self::NotFound { .. } => false,
            Self::AllProvidersFailed(inner) => inner.iter().any(Self::is_actionable),
            _ => true,
        }
    }

    /// Returns true for transient upstream failures worth another attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connector { .. } | Self::RateLimited { .. } | Self::ProviderTimeout { .. } => {
                true
            }
            Self::AllProvidersFailed(inner) => inner.iter().any(Self::is_retryable),
            _ => false,
        }
    }

    /// Returns true when the caller, not the upstream, is at fault.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::InvalidArg(_))
    }

    /// Flatten nested `AllProvidersFailed` structures into a plain vector.
    ///
    /// This preserves other error variants as-is and unwraps recursively.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::AllProvidersFailed(list) => list.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }
}

impl From<rust_decimal::Error> for FutureCoinError {
    fn from(e: rust_decimal::Error) -> Self {
        Self::DataIntegrity(e.to_string())
    }
}

impl From<chrono::ParseError> for FutureCoinError {
    fn from(e: chrono::ParseError) -> Self {
        Self::DataIntegrity(e.to_string())
    }
}

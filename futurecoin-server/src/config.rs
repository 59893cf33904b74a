use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use futurecoin_core::{
    Currency, CurrencyPolicy, DEFAULT_SYMBOLS, FallbackKind, FutureCoinError, Limits, Symbol,
};

/// Server configuration derived from environment variables.
///
/// A `.env` file in the working directory is loaded first when present;
/// variables already set in the process environment win over it.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: String,
    pub port: u16,

    // ── Providers ──────────────────────────────────────────────────
    pub yahoo_base_url: String,
    pub binance_base_url: String,
    pub cryptocompare_base_url: String,
    /// `CRYPTOCOMPARE_API_KEY`, falling back to `COINDESK_API_KEY`.
    pub cryptocompare_api_key: Option<String>,
    pub provider_timeout: Duration,
    pub retry_attempts: u32,

    // ── Prediction ─────────────────────────────────────────────────
    pub limits: Limits,
    pub currencies: CurrencyPolicy,
    pub supported_symbols: Vec<Symbol>,
    pub fallback: FallbackKind,

    // ── Files ──────────────────────────────────────────────────────
    pub models_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// Read the configuration from `.env` and the process environment.
    ///
    /// # Errors
    /// Returns `Config` for values that are present but malformed.
    pub fn from_env() -> Result<Self, FutureCoinError> {
        // A missing .env is the normal case in production.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    ///
    /// # Errors
    /// Returns `Config` for values that are present but malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FutureCoinError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);
        let limits = Limits {
            max_daily_lookback: vars.parse("YAHOO_FINANCE_DAYS_LIMIT", 60)?,
            max_hourly_lookback: vars.parse("BINANCE_HOURS_LIMIT", 60)?,
            max_days_ahead: vars.parse("DAYS_AHEAD_MAX", 30)?,
            max_hours_ahead: vars.parse("HOURS_AHEAD_MAX", 23)?,
        };
        let currencies = CurrencyPolicy {
            daily: vars.parse("DAILY_MODEL_CURRENCY", Currency::Inr)?,
            hourly: vars.parse("HOURLY_MODEL_CURRENCY", Currency::Usdt)?,
        };
        let estimator = vars
            .get("FALLBACK_ESTIMATOR")
            .map(|s| s.to_ascii_lowercase());
        let fallback = match estimator.as_deref() {
            None | Some("seeded") => FallbackKind::SeededNoise {
                seed: vars.parse("FALLBACK_SEED", 0)?,
            },
            Some("last") => FallbackKind::LastValue,
            Some("trend") => FallbackKind::LinearTrend,
            Some(other) => {
                return Err(FutureCoinError::Config(format!(
                    "FALLBACK_ESTIMATOR must be seeded, last or trend, got '{other}'"
                )));
            }
        };
        let supported_symbols = match vars.get("SUPPORTED_SYMBOLS") {
            Some(list) => parse_symbols(&list)?,
            None => DEFAULT_SYMBOLS
                .iter()
                .filter_map(|s| Symbol::new(s).ok())
                .collect(),
        };

        Ok(Self {
            bind: vars.get("BIND").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: vars.parse("PORT", 5000)?,
            yahoo_base_url: vars
                .get("YAHOO_BASE_URL")
                .unwrap_or_else(|| futurecoin_yahoo::adapter::DEFAULT_BASE_URL.to_string()),
            binance_base_url: vars
                .get("BINANCE_BASE_URL")
                .unwrap_or_else(|| futurecoin_binance::adapter::DEFAULT_BASE_URL.to_string()),
            cryptocompare_base_url: vars.get("CRYPTOCOMPARE_BASE_URL").unwrap_or_else(|| {
                futurecoin_cryptocompare::adapter::DEFAULT_BASE_URL.to_string()
            }),
            cryptocompare_api_key: vars
                .get("CRYPTOCOMPARE_API_KEY")
                .or_else(|| vars.get("COINDESK_API_KEY")),
            provider_timeout: Duration::from_millis(vars.parse("PROVIDER_TIMEOUT_MS", 10_000)?),
            retry_attempts: vars.parse("RETRY_ATTEMPTS", 3)?,
            limits,
            currencies,
            supported_symbols,
            fallback,
            models_dir: PathBuf::from(vars.get("MODELS_DIR").unwrap_or_else(|| "models".into())),
            data_dir: PathBuf::from(vars.get("DATA_DIR").unwrap_or_else(|| "data".into())),
        })
    }

    /// `bind:port` as accepted by `TcpListener::bind`.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn parse<T>(&self, name: &str, default: T) -> Result<T, FutureCoinError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(name) {
            None => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|e| FutureCoinError::Config(format!("{name}='{raw}': {e}"))),
        }
    }
}

fn parse_symbols(list: &str) -> Result<Vec<Symbol>, FutureCoinError> {
    let mut out: Vec<Symbol> = Vec::new();
    for raw in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let symbol = Symbol::new(raw)
            .map_err(|e| FutureCoinError::Config(format!("SUPPORTED_SYMBOLS: {e}")))?;
        if !out.contains(&symbol) {
            out.push(symbol);
        }
    }
    if out.is_empty() {
        return Err(FutureCoinError::Config(
            "SUPPORTED_SYMBOLS lists no symbols".into(),
        ));
    }
    Ok(out)
}

//! Market identifiers: symbols, currencies and interval classes.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FutureCoinError;

/// Short uppercase ticker token identifying a crypto asset (e.g. `BTC`).
///
/// Parsing trims whitespace and uppercases; the result must be 2 to 10
/// ASCII alphanumeric characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Parse and canonicalize a symbol token.
    ///
    /// # Errors
    /// Returns `Validation` with code `invalid_symbol` when the token is empty,
    /// too long, or contains characters other than ASCII letters and digits.
    pub fn new(raw: &str) -> Result<Self, FutureCoinError> {
        let s = raw.trim().to_ascii_uppercase();
        if !(2..=10).contains(&s.len()) || !s.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(FutureCoinError::validation(
                "invalid_symbol",
                format!("symbol '{raw}' must be 2-10 ASCII letters or digits"),
            ));
        }
        Ok(Self(s))
    }

    /// Borrow the canonical token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = FutureCoinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = FutureCoinError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Symbol> for String {
    fn from(s: Symbol) -> Self {
        s.0
    }
}

/// Currency a price series is quoted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[non_exhaustive]
pub enum Currency {
    /// United States dollar.
    Usd,
    /// Indian rupee.
    Inr,
    /// Tether, treated as a USD-stable token.
    Usdt,
}

impl Currency {
    /// ISO-style uppercase code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Inr => "INR",
            Self::Usdt => "USDT",
        }
    }

    /// True for currencies pegged one-to-one to USD.
    #[must_use]
    pub const fn is_usd_pegged(self) -> bool {
        matches!(self, Self::Usd | Self::Usdt)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = FutureCoinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "INR" => Ok(Self::Inr),
            "USDT" => Ok(Self::Usdt),
            other => Err(FutureCoinError::InvalidArg(format!(
                "unknown currency '{other}'"
            ))),
        }
    }
}

/// Granularity of a dataset; each class has its own model and output currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalClass {
    /// One candle per UTC day.
    Daily,
    /// One candle per hour.
    Hourly,
}

impl IntervalClass {
    /// Lowercase label used in file names and model keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Hourly => "hourly",
        }
    }

    /// Length of one interval in seconds.
    #[must_use]
    pub const fn seconds(self) -> i64 {
        match self {
            Self::Daily => 86_400,
            Self::Hourly => 3_600,
        }
    }

    /// Name of the timestamp column in dataset files.
    #[must_use]
    pub const fn time_column(self) -> &'static str {
        match self {
            Self::Daily => "Date",
            Self::Hourly => "Datetime",
        }
    }
}

impl fmt::Display for IntervalClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntervalClass {
    type Err = FutureCoinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "1d" | "day" => Ok(Self::Daily),
            "hourly" | "1h" | "hour" => Ok(Self::Hourly),
            other => Err(FutureCoinError::InvalidArg(format!(
                "unknown interval class '{other}'"
            ))),
        }
    }
}

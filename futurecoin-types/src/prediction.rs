//! Prediction request and response payloads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::Limits;
use crate::error::FutureCoinError;
use crate::market::{Currency, IntervalClass, Symbol};

/// A request for point estimates over a daily and/or hourly horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Asset to predict.
    pub symbol: Symbol,
    /// Optional USD basis price overriding the live spot price.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub current_price: Option<Decimal>,
    /// Days ahead for the daily prediction; `0` skips it.
    #[serde(default)]
    pub days_ahead: u32,
    /// Hours ahead for the hourly prediction; `0` skips it.
    #[serde(default)]
    pub hours_ahead: u32,
}

impl PredictionRequest {
    /// Create a request without a price override.
    #[must_use]
    pub const fn new(symbol: Symbol, days_ahead: u32, hours_ahead: u32) -> Self {
        Self {
            symbol,
            current_price: None,
            days_ahead,
            hours_ahead,
        }
    }

    /// Attach a USD basis price override.
    #[must_use]
    pub const fn with_current_price(mut self, price: Decimal) -> Self {
        self.current_price = Some(price);
        self
    }

    /// Check horizon bounds and the price override.
    ///
    /// # Errors
    /// Returns `Validation` with code `empty_horizon`, `days_out_of_range`,
    /// `hours_out_of_range` or `invalid_price`.
    pub fn validate(&self, limits: &Limits) -> Result<(), FutureCoinError> {
        if self.days_ahead == 0 && self.hours_ahead == 0 {
            return Err(FutureCoinError::validation(
                "empty_horizon",
                "at least one of days_ahead or hours_ahead must be greater than zero",
            ));
        }
        if self.days_ahead > limits.max_days_ahead {
            return Err(FutureCoinError::validation(
                "days_out_of_range",
                format!("days_ahead must be between 0 and {}", limits.max_days_ahead),
            ));
        }
        if self.hours_ahead > limits.max_hours_ahead {
            return Err(FutureCoinError::validation(
                "hours_out_of_range",
                format!("hours_ahead must be between 0 and {}", limits.max_hours_ahead),
            ));
        }
        if let Some(p) = self.current_price
            && p <= Decimal::ZERO
        {
            return Err(FutureCoinError::validation(
                "invalid_price",
                format!("current_price must be positive, got {p}"),
            ));
        }
        Ok(())
    }

    /// Requested horizons in interval order, skipping zero ones.
    #[must_use]
    pub fn horizons(&self) -> Vec<Horizon> {
        let mut out = Vec::with_capacity(2);
        if self.days_ahead > 0 {
            out.push(Horizon::DaysAhead(self.days_ahead));
        }
        if self.hours_ahead > 0 {
            out.push(Horizon::HoursAhead(self.hours_ahead));
        }
        out
    }
}

/// Forward distance of a prediction, serialized as `days_ahead` or `hours_ahead`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    /// Whole days ahead.
    DaysAhead(u32),
    /// Whole hours ahead.
    HoursAhead(u32),
}

impl Horizon {
    /// Interval class the horizon is measured in.
    #[must_use]
    pub const fn interval(self) -> IntervalClass {
        match self {
            Self::DaysAhead(_) => IntervalClass::Daily,
            Self::HoursAhead(_) => IntervalClass::Hourly,
        }
    }

    /// Number of intervals ahead.
    #[must_use]
    pub const fn steps(self) -> u32 {
        match self {
            Self::DaysAhead(n) | Self::HoursAhead(n) => n,
        }
    }
}

/// A single point estimate for one horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonPrediction {
    /// Estimated price at the horizon, never negative.
    #[serde(with = "rust_decimal::serde::float")]
    pub predicted_price: Decimal,
    /// Currency of `predicted_price`.
    pub currency: Currency,
    /// Horizon the estimate refers to.
    #[serde(flatten)]
    pub horizon: Horizon,
    /// Producer of the estimate, e.g. `daily_lstm` or `fallback`.
    pub model_type: String,
    /// Confidence score in `[0, 1]`.
    pub confidence: f64,
    /// Offline evaluation metric of the producing model, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

/// Response to a [`PredictionRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Asset the predictions refer to.
    pub symbol: Symbol,
    /// When the result was produced.
    pub timestamp: DateTime<Utc>,
    /// USD basis price the predictions were derived from.
    #[serde(with = "rust_decimal::serde::float")]
    pub current_price: Decimal,
    /// Daily-horizon estimate, present when `days_ahead > 0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_prediction: Option<HorizonPrediction>,
    /// Hourly-horizon estimate, present when `hours_ahead > 0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_prediction: Option<HorizonPrediction>,
    /// Why the daily estimate is missing although it was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_error: Option<HorizonError>,
    /// Why the hourly estimate is missing although it was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_error: Option<HorizonError>,
}

impl PredictionResult {
    /// Record the estimate or the failure for `horizon`.
    pub fn set_horizon(
        &mut self,
        horizon: Horizon,
        outcome: Result<HorizonPrediction, HorizonError>,
    ) {
        let (prediction, error) = match outcome {
            Ok(p) => (Some(p), None),
            Err(e) => (None, Some(e)),
        };
        match horizon {
            Horizon::DaysAhead(_) => {
                self.daily_prediction = prediction;
                self.daily_error = error;
            }
            Horizon::HoursAhead(_) => {
                self.hourly_prediction = prediction;
                self.hourly_error = error;
            }
        }
    }
}

/// A failed horizon inside an otherwise successful [`PredictionResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonError {
    /// Stable snake_case code, as in [`FutureCoinError::code`].
    pub code: String,
    /// Human-readable detail.
    pub message: String,
}

impl From<&FutureCoinError> for HorizonError {
    fn from(e: &FutureCoinError) -> Self {
        Self {
            code: e.code().to_string(),
            message: e.to_string(),
        }
    }
}

/// Error metrics of one prediction against the realized price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    /// Absolute error.
    pub mae: f64,
    /// Absolute percentage error, in percent.
    pub ape: f64,
}

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use futurecoin::{Currency, FutureCoinError, PredictionRequest, PredictionResult, Symbol};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

/// Build prediction sub-router.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/predict/{symbol}", post(predict))
        .route("/api/current-price/{symbol}", get(current_price))
}

/// JSON body of `POST /api/predict/{symbol}`.
///
/// Horizons are read as signed integers so that negative values produce a
/// range error instead of a decode error.
#[derive(Debug, Default, Deserialize)]
pub struct PredictBody {
    /// Ignored when it disagrees with the path; the path wins.
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub days_ahead: i64,
    #[serde(default)]
    pub hours_ahead: i64,
    /// USD basis price overriding the live quote.
    #[serde(default)]
    pub current_price: Option<f64>,
}

impl PredictBody {
    fn into_request(self, symbol: Symbol) -> Result<PredictionRequest, FutureCoinError> {
        let days = horizon(self.days_ahead, "days_out_of_range", "days_ahead")?;
        let hours = horizon(self.hours_ahead, "hours_out_of_range", "hours_ahead")?;
        let req = PredictionRequest::new(symbol, days, hours);
        match self.current_price {
            None => Ok(req),
            Some(p) => Decimal::from_f64(p)
                .map(|d| req.with_current_price(d))
                .ok_or_else(|| {
                    FutureCoinError::validation(
                        "invalid_price",
                        format!("current_price must be a finite number, got {p}"),
                    )
                }),
        }
    }
}

fn horizon(value: i64, code: &str, field: &str) -> Result<u32, FutureCoinError> {
    u32::try_from(value).map_err(|_| {
        let msg = if value < 0 {
            format!("{field} must not be negative, got {value}")
        } else {
            format!("{field} is out of range, got {value}")
        };
        FutureCoinError::validation(code, msg)
    })
}

/// POST /api/predict/{symbol}: Daily and/or hourly point estimates.
#[tracing::instrument(name = "futurecoin_server::predict", skip(state, body))]
async fn predict(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    body: Result<Json<PredictBody>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(body) = body?;
    let symbol = Symbol::new(&symbol)?;
    if let Some(other) = body.symbol.as_deref()
        && !other.trim().eq_ignore_ascii_case(symbol.as_str())
    {
        tracing::debug!(body_symbol = other, "body symbol differs from path; using path");
    }
    let req = body.into_request(symbol)?;
    let result = state.fc.predict(req).await?;
    Ok(Json(result))
}

/// Response of `GET /api/current-price/{symbol}`.
#[derive(Debug, Serialize)]
pub struct CurrentPrice {
    pub symbol: Symbol,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub currency: Currency,
    pub as_of: DateTime<Utc>,
}

/// GET /api/current-price/{symbol}: Latest spot price from the first answering provider.
async fn current_price(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<CurrentPrice>, ApiError> {
    let symbol = Symbol::new(&symbol)?;
    let spot = state.fc.spot_price(&symbol).await?;
    Ok(Json(CurrentPrice {
        symbol: spot.symbol,
        price: spot.price,
        currency: spot.currency,
        as_of: spot.as_of,
    }))
}

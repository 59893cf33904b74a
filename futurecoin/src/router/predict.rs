use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use futurecoin_core::{
    Currency, Dataset, FallbackInput, FutureCoinError, Horizon, HorizonError, HorizonPrediction,
    IntervalClass, ModelRegistry, PredictionRequest, PredictionResult, RateTable, Symbol,
    convert_dataset, convert_price,
};

use crate::FutureCoin;

/// Per-request memo of fetched inputs; each is fetched at most once.
#[derive(Default)]
struct Inputs {
    history: HashMap<IntervalClass, Option<Dataset>>,
    rates: HashMap<Currency, RateTable>,
}

impl FutureCoin {
    /// Produce point estimates for the requested horizons.
    ///
    /// Flow: validate, resolve the USD basis price, then per horizon look up
    /// a trained model and run it over recent history, degrading to the
    /// configured fallback estimator when the model is absent or cannot run.
    ///
    /// - Validation (horizons, price override, supported symbol) happens
    ///   before any provider or model access.
    /// - Basis: the override, else the spot price, else the last close of
    ///   the first horizon's history.
    /// - Daily estimates are quoted in the configured daily currency and
    ///   hourly estimates in the hourly one; non-pegged currencies use the
    ///   latest USD rate.
    ///
    /// # Errors
    /// - `Validation` for rejected requests.
    /// - `NotFound` when no basis price can be determined.
    /// - A horizon whose output currency needs an exchange rate that cannot
    ///   be fetched is reported in `daily_error`/`hourly_error`; the other
    ///   horizon is still answered. Only when every requested horizon fails
    ///   is the first horizon's error returned.
    /// - `RequestTimeout` when the configured request deadline elapses.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            target = "futurecoin::router",
            name = "futurecoin::router::predict",
            skip(self, req),
            fields(symbol = %req.symbol, days_ahead = req.days_ahead, hours_ahead = req.hours_ahead),
        )
    )]
    pub async fn predict(&self, req: PredictionRequest) -> Result<PredictionResult, FutureCoinError> {
        req.validate(&self.cfg.limits)?;
        self.ensure_supported(&req.symbol)?;

        crate::core::with_request_deadline(self.cfg.request_timeout, self.predict_inner(&req))
            .await?
    }

    async fn predict_inner(
        &self,
        req: &PredictionRequest,
    ) -> Result<PredictionResult, FutureCoinError> {
        let horizons = req.horizons();
        let models = self.models().await;
        let mut inputs = Inputs::default();

        let basis = self.basis_price(req, &horizons, &mut inputs).await?;

        let mut out = PredictionResult {
            symbol: req.symbol.clone(),
            timestamp: Utc::now(),
            current_price: basis,
            daily_prediction: None,
            hourly_prediction: None,
            daily_error: None,
            hourly_error: None,
        };
        let mut first_err = None;
        let mut produced = 0usize;
        for horizon in horizons {
            match self
                .predict_horizon(&req.symbol, horizon, basis, &models, &mut inputs)
                .await
            {
                Ok(p) => {
                    produced += 1;
                    out.set_horizon(horizon, Ok(p));
                }
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(horizon = %horizon.interval(), error = %e, "horizon prediction failed");
                    out.set_horizon(horizon, Err(HorizonError::from(&e)));
                    first_err.get_or_insert(e);
                }
            }
        }
        match first_err {
            Some(e) if produced == 0 => Err(e),
            _ => Ok(out),
        }
    }

    async fn basis_price(
        &self,
        req: &PredictionRequest,
        horizons: &[Horizon],
        inputs: &mut Inputs,
    ) -> Result<Decimal, FutureCoinError> {
        if let Some(p) = req.current_price {
            return Ok(p);
        }
        match self.spot_price(&req.symbol).await {
            Ok(spot) if spot.currency.is_usd_pegged() && spot.price > Decimal::ZERO => {
                return Ok(spot.price);
            }
            Ok(_) => {}
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %_e, "spot price unavailable; using last close");
            }
        }
        if let Some(interval) = horizons.first().map(|h| h.interval())
            && let Some(ds) = self.memo_history(&req.symbol, interval, inputs).await
            && ds.currency().is_usd_pegged()
            && let Some(last) = ds.last()
        {
            return Ok(last.close);
        }
        Err(FutureCoinError::not_found(format!(
            "basis price for {}",
            req.symbol
        )))
    }

    /// History in the supplying connector's currency; `None` when unavailable.
    async fn memo_history<'i>(
        &self,
        symbol: &Symbol,
        interval: IntervalClass,
        inputs: &'i mut Inputs,
    ) -> Option<&'i Dataset> {
        if !inputs.history.contains_key(&interval) {
            let fetched = match self.history(symbol, interval).await {
                Ok(ds) => Some(ds),
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(interval = %interval, error = %_e, "history unavailable");
                    None
                }
            };
            inputs.history.insert(interval, fetched);
        }
        inputs.history.get(&interval).and_then(Option::as_ref)
    }

    async fn memo_rates<'i>(
        &self,
        currency: Currency,
        inputs: &'i mut Inputs,
    ) -> Result<Option<&'i RateTable>, FutureCoinError> {
        if currency.is_usd_pegged() {
            return Ok(None);
        }
        if !inputs.rates.contains_key(&currency) {
            let days = self
                .cfg
                .limits
                .max_lookback(IntervalClass::Daily)
                .max(self.cfg.limits.max_lookback(IntervalClass::Hourly).div_ceil(24))
                .saturating_add(7);
            let table = self.exchange_rates(Currency::Usd, currency, days).await?;
            inputs.rates.insert(currency, table);
        }
        Ok(inputs.rates.get(&currency))
    }

    async fn predict_horizon(
        &self,
        symbol: &Symbol,
        horizon: Horizon,
        basis_usd: Decimal,
        models: &ModelRegistry,
        inputs: &mut Inputs,
    ) -> Result<HorizonPrediction, FutureCoinError> {
        let interval = horizon.interval();
        let currency = self.cfg.currencies.for_interval(interval);
        let table = self.memo_rates(currency, inputs).await?.cloned();
        let basis = convert_price(basis_usd, Currency::Usd, currency, table.as_ref())?;

        let model = models.get(symbol, interval);
        let wants_history = model.is_ok() || self.estimator.needs_history();
        let closes: Vec<Decimal> = if wants_history {
            match self.memo_history(symbol, interval, inputs).await {
                Some(ds) => match convert_dataset(ds.clone(), currency, table.as_ref()) {
                    Ok(n) => n.dataset.closes(),
                    Err(_e) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(error = %_e, "history could not be converted");
                        Vec::new()
                    }
                },
                None => Vec::new(),
            }
        } else {
            Vec::new()
        };

        match model {
            Ok(model) => {
                let n = model.sequence_length();
                if closes.len() >= n {
                    let window: Vec<f64> = closes[closes.len() - n..]
                        .iter()
                        .filter_map(ToPrimitive::to_f64)
                        .collect();
                    match model
                        .predict(&window, horizon.steps())
                        .and_then(|v| to_price(v, model.key()))
                    {
                        Ok(predicted) => {
                            return Ok(HorizonPrediction {
                                predicted_price: predicted,
                                currency,
                                horizon,
                                model_type: format!("{interval}_{}", model.model_type()),
                                confidence: model.confidence(),
                                accuracy: model.accuracy(),
                            });
                        }
                        Err(_e) => {
                            #[cfg(feature = "tracing")]
                            tracing::warn!(model = model.key(), error = %_e, "model failed; using fallback");
                        }
                    }
                } else {
                    #[cfg(feature = "tracing")]
                    tracing::info!(
                        model = model.key(),
                        have = closes.len(),
                        need = n,
                        "insufficient history for model; using fallback"
                    );
                }
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %_e, "no model; using fallback");
            }
        }

        let est = self.estimator.estimate(&FallbackInput {
            symbol,
            interval,
            steps: horizon.steps(),
            basis,
            closes: &closes,
        });
        Ok(HorizonPrediction {
            predicted_price: est.predicted.max(Decimal::ZERO),
            currency,
            horizon,
            model_type: self.estimator.name().to_string(),
            confidence: est.confidence,
            accuracy: None,
        })
    }
}

fn to_price(v: f64, key: &str) -> Result<Decimal, FutureCoinError> {
    if !v.is_finite() {
        return Err(FutureCoinError::DataIntegrity(format!(
            "{key} produced a non-finite estimate"
        )));
    }
    Decimal::from_f64(v.max(0.0))
        .map(|d| d.round_dp(8))
        .ok_or_else(|| FutureCoinError::DataIntegrity(format!("{key} estimate out of range")))
}

use futurecoin_types::{Candle, Currency, Dataset, FutureCoinError, RateTable};
use rust_decimal::Decimal;

/// Outcome of converting a dataset into another currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// Converted dataset.
    pub dataset: Dataset,
    /// Candles dropped because no rate was dated on or before them.
    pub dropped: usize,
}

/// Convert a dataset's OHLC prices with the rate applicable to each candle's date.
///
/// - The applicable rate is the nearest sample dated on or before the candle's UTC date.
/// - Candles without an applicable rate are dropped and counted, never estimated.
/// - Volume is left untouched; the currency tag becomes the table's quote currency.
///
/// - A USD-pegged dataset is accepted by a USD-pegged base at parity, so USDT
///   candles convert with a USD table.
///
/// # Errors
/// Returns `InvalidArg` when the dataset is not quoted in the table's base currency.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        name = "futurecoin_core::timeseries::normalize_dataset",
        skip(ds, table),
        fields(symbol = %ds.symbol(), from = %ds.currency(), to = %table.quote()),
    )
)]
pub fn normalize_dataset(ds: Dataset, table: &RateTable) -> Result<Normalized, FutureCoinError> {
    if !same_base(ds.currency(), table.base()) {
        return Err(FutureCoinError::InvalidArg(format!(
            "{} dataset is quoted in {}, rate table converts from {}",
            ds.symbol(),
            ds.currency(),
            table.base()
        )));
    }
    let symbol = ds.symbol().clone();
    let interval = ds.interval();
    let quote = table.quote();
    let mut dropped = 0usize;
    let mut out = Vec::with_capacity(ds.len());
    for c in ds.into_candles() {
        match table.rate_on(c.ts.date_naive()) {
            Some(rate) => out.push(scale(c, rate, quote)),
            None => dropped += 1,
        }
    }
    #[cfg(feature = "tracing")]
    if dropped > 0 {
        tracing::warn!(dropped, "candles without an exchange rate were dropped");
    }
    Ok(Normalized {
        dataset: Dataset::new(symbol, interval, quote, out),
        dropped,
    })
}

/// Re-tag a dataset between USD-pegged currencies at parity.
///
/// # Errors
/// Returns `InvalidArg` unless both currencies are USD-pegged.
pub fn retag_pegged(ds: Dataset, target: Currency) -> Result<Dataset, FutureCoinError> {
    if ds.currency() == target {
        return Ok(ds);
    }
    if !(ds.currency().is_usd_pegged() && target.is_usd_pegged()) {
        return Err(FutureCoinError::InvalidArg(format!(
            "{} to {target} needs an exchange rate",
            ds.currency()
        )));
    }
    let symbol = ds.symbol().clone();
    let interval = ds.interval();
    let candles = ds
        .into_candles()
        .into_iter()
        .map(|c| Candle {
            currency: target,
            ..c
        })
        .collect();
    Ok(Dataset::new(symbol, interval, target, candles))
}

/// Convert a dataset into `target`, using `table` only when parity does not apply.
///
/// # Errors
/// Returns `InvalidArg` when a rate is needed and `table` is absent or converts
/// a different pair.
pub fn convert_dataset(
    ds: Dataset,
    target: Currency,
    table: Option<&RateTable>,
) -> Result<Normalized, FutureCoinError> {
    if ds.currency() == target || (ds.currency().is_usd_pegged() && target.is_usd_pegged()) {
        return Ok(Normalized {
            dataset: retag_pegged(ds, target)?,
            dropped: 0,
        });
    }
    match table {
        Some(t) if t.quote() == target => normalize_dataset(ds, t),
        _ => Err(FutureCoinError::InvalidArg(format!(
            "no {} to {target} rate table supplied",
            ds.currency()
        ))),
    }
}

/// Convert a single USD-pegged price into `target` using the latest rate.
///
/// # Errors
/// Returns `NotFound` when a rate is needed and the table has no samples.
pub fn convert_price(
    price: Decimal,
    from: Currency,
    target: Currency,
    table: Option<&RateTable>,
) -> Result<Decimal, FutureCoinError> {
    if from == target || (from.is_usd_pegged() && target.is_usd_pegged()) {
        return Ok(price);
    }
    table
        .filter(|t| same_base(from, t.base()) && t.quote() == target)
        .and_then(RateTable::latest)
        .map(|s| price * s.rate)
        .ok_or_else(|| FutureCoinError::not_found(format!("{from} to {target} exchange rate")))
}

/// Equal, or both pegged to USD.
fn same_base(from: Currency, base: Currency) -> bool {
    from == base || (from.is_usd_pegged() && base.is_usd_pegged())
}

fn scale(c: Candle, rate: Decimal, quote: Currency) -> Candle {
    Candle {
        open: c.open * rate,
        high: c.high * rate,
        low: c.low * rate,
        close: c.close * rate,
        currency: quote,
        ..c
    }
}

use futurecoin_types::{Candle, Dataset, FutureCoinError};

/// Split candles into those satisfying OHLCV invariants and the errors of the rest.
///
/// Input order is preserved for kept candles.
#[must_use]
pub fn partition_valid(candles: Vec<Candle>) -> (Vec<Candle>, Vec<FutureCoinError>) {
    let mut kept = Vec::with_capacity(candles.len());
    let mut rejected = Vec::new();
    for c in candles {
        match c.validate() {
            Ok(()) => kept.push(c),
            Err(e) => rejected.push(e),
        }
    }
    (kept, rejected)
}

/// Drop invalid candles from a dataset, logging each one.
///
/// Returns the cleaned dataset and the number of dropped rows.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        name = "futurecoin_core::timeseries::sanitize_dataset",
        skip(ds),
        fields(symbol = %ds.symbol(), interval = %ds.interval(), rows = ds.len()),
    )
)]
#[must_use]
pub fn sanitize_dataset(ds: Dataset) -> (Dataset, usize) {
    let symbol = ds.symbol().clone();
    let interval = ds.interval();
    let currency = ds.currency();
    let (kept, rejected) = partition_valid(ds.into_candles());
    #[cfg(feature = "tracing")]
    for e in &rejected {
        tracing::warn!(error = %e, "dropping candle");
    }
    (
        Dataset::new(symbol, interval, currency, kept),
        rejected.len(),
    )
}

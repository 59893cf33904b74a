use std::collections::{BTreeMap, HashMap, btree_map::Entry};

use chrono::{DateTime, Utc};
use futurecoin_types::{Candle, Currency, Dataset, FutureCoinError, IntervalClass, MergedDataset, Symbol};

/// Merge candles of one symbol from several series (first series has higher priority).
///
/// Returns candles sorted by timestamp with first-wins semantics on duplicate
/// timestamps.
///
/// # Errors
/// Returns `DataIntegrity` if the series mix symbols or currencies.
pub fn merge_candles_by_priority<I>(series: I) -> Result<Vec<Candle>, FutureCoinError>
where
    I: IntoIterator<Item = Vec<Candle>>,
{
    let mut map: BTreeMap<DateTime<Utc>, Candle> = BTreeMap::new();
    let mut identity: Option<(Symbol, Currency)> = None;
    for s in series {
        for c in s {
            match &identity {
                Some((sym, cur)) if *sym != c.symbol || *cur != c.currency => {
                    return Err(FutureCoinError::DataIntegrity(format!(
                        "mixed series: expected {sym}/{cur}, got {}/{} at {}",
                        c.symbol,
                        c.currency,
                        c.ts.to_rfc3339()
                    )));
                }
                Some(_) => {}
                None => identity = Some((c.symbol.clone(), c.currency)),
            }
            map.entry(c.ts).or_insert(c);
        }
    }
    Ok(map.into_values().collect())
}

/// Merge per-symbol datasets into one table sorted by `(timestamp, symbol)`.
///
/// - Duplicate `(timestamp, symbol)` pairs keep the row from the earliest dataset.
/// - Output is deterministic for a given input order.
///
/// # Errors
/// Returns `InvalidArg` if a dataset has a different interval class, and
/// `DataIntegrity` if one symbol appears in two different currencies.
pub fn merge_datasets<I>(interval: IntervalClass, datasets: I) -> Result<MergedDataset, FutureCoinError>
where
    I: IntoIterator<Item = Dataset>,
{
    let mut rows: BTreeMap<(DateTime<Utc>, Symbol), Candle> = BTreeMap::new();
    let mut currency_of: HashMap<Symbol, Currency> = HashMap::new();

    for ds in datasets {
        if ds.interval() != interval {
            return Err(FutureCoinError::InvalidArg(format!(
                "cannot merge {} dataset for {} into {interval} table",
                ds.interval(),
                ds.symbol()
            )));
        }
        let cur = *currency_of
            .entry(ds.symbol().clone())
            .or_insert(ds.currency());
        if cur != ds.currency() {
            return Err(FutureCoinError::DataIntegrity(format!(
                "{} appears in both {cur} and {}",
                ds.symbol(),
                ds.currency()
            )));
        }
        for c in ds.into_candles() {
            if let Entry::Vacant(v) = rows.entry((c.ts, c.symbol.clone())) {
                v.insert(c);
            }
        }
    }

    Ok(MergedDataset::new(interval, rows.into_values().collect()))
}

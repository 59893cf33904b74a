use chrono::{DateTime, TimeZone, Utc};
use futurecoin_core::{Candle, Currency, Dataset, HistoryRequest, IntervalClass, Symbol};
use rust_decimal::Decimal;

/// Number of candles generated per symbol and interval.
pub const SERIES_LEN: i64 = 120;

/// Exclusive end of every fixture series.
pub fn series_end() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn base_price(symbol: &str) -> Option<i64> {
    match symbol {
        "BTC" => Some(60_000),
        "ETH" => Some(3_400),
        "SOL" => Some(140),
        "ADA" => Some(1),
        _ => None,
    }
}

/// Deterministic candle series for a known symbol, honoring lookback and end.
pub fn by_symbol(symbol: &Symbol, req: HistoryRequest) -> Option<Dataset> {
    let base = Decimal::from(base_price(symbol.as_str())?);
    let step = req.interval.seconds();
    let first = series_end().timestamp() - step * SERIES_LEN;
    let end = req.end.unwrap_or_else(series_end);

    let candles: Vec<Candle> = (0..SERIES_LEN)
        .filter_map(|i| {
            let ts = DateTime::<Utc>::from_timestamp(first + step * i, 0)?;
            (ts < end).then(|| candle(symbol, ts, base, i))
        })
        .collect();
    let start = candles.len().saturating_sub(req.lookback as usize);
    Some(Dataset::new(
        symbol.clone(),
        req.interval,
        Currency::Usd,
        candles[start..].to_vec(),
    ))
}

// Gentle upward drift with a weekly wobble: close_i = base * (1 + i/1000 + wobble/100).
fn candle(symbol: &Symbol, ts: DateTime<Utc>, base: Decimal, i: i64) -> Candle {
    let wobble = Decimal::from((i % 7) - 3);
    let close = base * (Decimal::ONE + Decimal::new(i, 3) + wobble / Decimal::ONE_HUNDRED);
    let open = base * (Decimal::ONE + Decimal::new(i, 3));
    let high = open.max(close) * Decimal::new(101, 2);
    let low = open.min(close) * Decimal::new(99, 2);
    Candle {
        ts,
        open,
        high,
        low,
        close,
        volume: Decimal::from(1_000 + i * 10),
        symbol: symbol.clone(),
        currency: Currency::Usd,
    }
}

/// Intervals the fixture connector serves.
pub const INTERVALS: &[IntervalClass] = &[IntervalClass::Daily, IntervalClass::Hourly];

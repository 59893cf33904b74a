// Re-export helpers so tests can `use helpers::*;`
#![allow(dead_code)]
pub mod mock_connector;

pub use mock_connector::{MockConnector, m_hist, m_quote, m_rates};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use futurecoin_core::{
    Candle, Currency, Dataset, ExchangeRateSample, IntervalClass, RateTable, Symbol,
};
use rust_decimal::Decimal;

// ---------- Lightweight fixtures and helpers for tests ----------

/// Common symbol constants used across tests.
pub const BTC: &str = "BTC";
pub const ETH: &str = "ETH";
pub const SOL: &str = "SOL";
pub const XRP: &str = "XRP";

/// Construct a UTC `DateTime` from components for readability in tests.
pub fn dt(y: i32, m: u32, d: u32, hh: u32) -> DateTime<Utc> {
    let date = NaiveDate::from_ymd_opt(y, m, d).expect("invalid date");
    let naive = date.and_hms_opt(hh, 0, 0).expect("invalid time components");
    DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc)
}

/// Parse a static test symbol.
pub fn sym(s: &str) -> Symbol {
    Symbol::new(s).expect("valid static test symbol")
}

/// Decimal from a string literal.
pub fn dec(s: &str) -> Decimal {
    s.parse().expect("valid decimal literal")
}

/// Flat candle (open = high = low = close) with unit volume.
pub fn candle(symbol: &str, ts: DateTime<Utc>, close: &str, currency: Currency) -> Candle {
    let p = dec(close);
    Candle {
        ts,
        open: p,
        high: p,
        low: p,
        close: p,
        volume: Decimal::ONE,
        symbol: sym(symbol),
        currency,
    }
}

/// USD dataset of `closes` spaced one interval apart, ending at 2024-06-30.
pub fn series(symbol: &str, interval: IntervalClass, closes: &[&str]) -> Dataset {
    let step = Duration::seconds(interval.seconds());
    let last = dt(2024, 6, 30, 0);
    let n = i32::try_from(closes.len()).expect("short test series");
    let candles = closes
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let back = n - 1 - i32::try_from(i).expect("short test series");
            candle(symbol, last - step * back, c, Currency::Usd)
        })
        .collect();
    Dataset::new(sym(symbol), interval, Currency::Usd, candles)
}

/// USD to INR table with one sample per day for `days` days ending 2024-06-30.
pub fn inr_table(rate: &str, days: i64) -> RateTable {
    let last = dt(2024, 6, 30, 0).date_naive();
    let samples = (0..days)
        .map(|back| ExchangeRateSample {
            date: last - Duration::days(back),
            rate: dec(rate),
        })
        .collect();
    RateTable::new(Currency::Usd, Currency::Inr, samples)
}

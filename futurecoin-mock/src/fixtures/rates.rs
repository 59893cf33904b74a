use chrono::{Duration, NaiveDate};
use futurecoin_core::{Currency, ExchangeRateSample, RateRequest, RateTable};
use rust_decimal::Decimal;

use super::history::series_end;

/// USD to INR rates for the fixture window, oscillating around 83.
pub fn usd_inr(req: RateRequest) -> Option<RateTable> {
    if req.base != Currency::Usd || req.quote != Currency::Inr {
        return None;
    }
    let last: NaiveDate = series_end().date_naive();
    let samples = (0..i64::from(req.days))
        .map(|back| {
            let date = last - Duration::days(back);
            ExchangeRateSample {
                date,
                rate: Decimal::new(8_300 + (back % 5) * 5, 2),
            }
        })
        .collect();
    Some(RateTable::new(Currency::Usd, Currency::Inr, samples))
}

use futurecoin_core::{Currency, SpotPrice, Symbol};
use rust_decimal::Decimal;

use super::history::series_end;

pub fn by_symbol(symbol: &Symbol) -> Option<SpotPrice> {
    let price = match symbol.as_str() {
        "BTC" => Decimal::new(50_000, 0),
        "ETH" => Decimal::new(3_000, 0),
        "SOL" => Decimal::new(1455, 1),
        "ADA" => Decimal::new(45, 2),
        _ => return None,
    };
    Some(SpotPrice {
        symbol: symbol.clone(),
        price,
        currency: Currency::Usd,
        as_of: series_end(),
    })
}

use std::sync::Arc;

use futurecoin::{FutureCoin, FutureCoinConnector, IntervalClass};

use crate::helpers::{BTC, ETH, m_hist, m_quote, sym};

#[tokio::test]
async fn registration_order_is_the_default_priority() {
    let a = m_quote("a", "1");
    let b = m_quote("b", "2");

    let fc = FutureCoin::builder()
        .with_connector(a.clone())
        .with_connector(b.clone())
        .build()
        .unwrap();

    let q = fc.spot_price(&sym(BTC)).await.unwrap();
    assert_eq!(q.price, crate::helpers::dec("1"));
    assert_eq!(b.calls(), 0);
}

#[tokio::test]
async fn symbol_priority_overrides_registration_order() {
    let a = m_quote("a", "1");
    let b = m_quote("b", "2");
    let b_dyn: Arc<dyn FutureCoinConnector> = b.clone();

    let fc = FutureCoin::builder()
        .with_connector(a.clone())
        .with_connector(b.clone())
        .prefer_symbol(&sym(ETH), &[b_dyn])
        .build()
        .unwrap();

    let eth = fc.spot_price(&sym(ETH)).await.unwrap();
    assert_eq!(eth.price, crate::helpers::dec("2"));
    // Other symbols keep the registration order.
    let btc = fc.spot_price(&sym(BTC)).await.unwrap();
    assert_eq!(btc.price, crate::helpers::dec("1"));
}

#[tokio::test]
async fn interval_priority_orders_history_providers() {
    let daily_first = m_hist("daily_first", IntervalClass::Hourly, &["10", "11"]);
    let hourly_pref = m_hist("hourly_pref", IntervalClass::Hourly, &["20", "21"]);
    let pref: Arc<dyn FutureCoinConnector> = hourly_pref.clone();

    let fc = FutureCoin::builder()
        .with_connector(daily_first.clone())
        .with_connector(hourly_pref.clone())
        .prefer_for_interval(IntervalClass::Hourly, &[pref])
        .build()
        .unwrap();

    let ds = fc.history(&sym(BTC), IntervalClass::Hourly).await.unwrap();
    assert_eq!(ds.last().unwrap().close, crate::helpers::dec("21"));
    assert_eq!(daily_first.calls(), 0);

    let ds = fc.history(&sym(BTC), IntervalClass::Daily).await.unwrap();
    assert_eq!(ds.last().unwrap().close, crate::helpers::dec("11"));
}

#[tokio::test]
async fn unknown_priority_keys_are_ignored() {
    let a = m_quote("a", "1");
    let ghost: Arc<dyn FutureCoinConnector> = m_quote("ghost", "9");

    let fc = FutureCoin::builder()
        .with_connector(a)
        .prefer_symbol(&sym(BTC), &[ghost])
        .build()
        .unwrap();

    assert!(fc.config().per_symbol_priority[&sym(BTC)].is_empty());
    let q = fc.spot_price(&sym(BTC)).await.unwrap();
    assert_eq!(q.price, crate::helpers::dec("1"));
}

use std::time::Duration;

use futurecoin::{FetchStrategy, FutureCoin, FutureCoinError};

use crate::helpers::{BTC, MockConnector, dec, m_quote, sym};

#[tokio::test]
async fn strategy_latency_returns_fastest_success() {
    let fast_ok = MockConnector::builder()
        .name("fast")
        .delay(Duration::from_millis(10))
        .returns_quote_ok(dec("11"))
        .build();
    let slow_ok = MockConnector::builder()
        .name("slow")
        .delay(Duration::from_millis(100))
        .returns_quote_ok(dec("99"))
        .build();

    let fc = FutureCoin::builder()
        .with_connector(slow_ok)
        .with_connector(fast_ok)
        .fetch_strategy(FetchStrategy::Latency)
        .build()
        .unwrap();

    let q = fc.spot_price(&sym(BTC)).await.unwrap();
    assert_eq!(q.price, dec("11"));
}

#[tokio::test]
async fn strategy_latency_ignores_faster_failure_and_returns_first_success() {
    let fast_fail = MockConnector::builder()
        .name("fast_fail")
        .delay(Duration::from_millis(5))
        .with_quote_fn(|_| Err(FutureCoinError::Other("boom".into())))
        .build();
    let slow_ok = MockConnector::builder()
        .name("slow_ok")
        .delay(Duration::from_millis(20))
        .returns_quote_ok(dec("77"))
        .build();

    let fc = FutureCoin::builder()
        .with_connector(fast_fail)
        .with_connector(slow_ok)
        .fetch_strategy(FetchStrategy::Latency)
        .build()
        .unwrap();

    let q = fc.spot_price(&sym(BTC)).await.unwrap();
    assert_eq!(q.price, dec("77"));
}

#[tokio::test]
async fn strategy_priority_with_fallback_obeys_order_and_timeout() {
    // First connector exceeds the provider timeout; second succeeds.
    let very_slow = MockConnector::builder()
        .name("first")
        .delay(Duration::from_millis(200))
        .returns_quote_ok(dec("1000"))
        .build();
    let ok = MockConnector::builder()
        .name("second")
        .delay(Duration::from_millis(10))
        .returns_quote_ok(dec("42"))
        .build();

    let fc = FutureCoin::builder()
        .with_connector(very_slow)
        .with_connector(ok)
        .fetch_strategy(FetchStrategy::PriorityWithFallback)
        .provider_timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let q = fc.spot_price(&sym(BTC)).await.unwrap();
    assert_eq!(q.price, dec("42"));
}

#[tokio::test]
async fn all_providers_timing_out_is_reported_as_such() {
    let a = MockConnector::builder()
        .name("a")
        .delay(Duration::from_millis(200))
        .returns_quote_ok(dec("1"))
        .build();
    let b = MockConnector::builder()
        .name("b")
        .delay(Duration::from_millis(200))
        .returns_quote_ok(dec("2"))
        .build();

    let fc = FutureCoin::builder()
        .with_connector(a)
        .with_connector(b)
        .provider_timeout(Duration::from_millis(20))
        .build()
        .unwrap();

    let err = fc.spot_price(&sym(BTC)).await.unwrap_err();
    assert!(
        matches!(err, FutureCoinError::AllProvidersTimedOut { ref capability } if capability == "quote"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn no_capable_connector_is_unsupported() {
    let fc = FutureCoin::builder()
        .with_connector(crate::helpers::m_rates("rates_only", "83"))
        .build()
        .unwrap();

    let err = fc.spot_price(&sym(BTC)).await.unwrap_err();
    assert!(matches!(err, FutureCoinError::Unsupported { .. }), "{err:?}");
}

#[test]
fn build_without_connectors_fails() {
    let err = FutureCoin::builder().build().err().unwrap();
    assert!(matches!(err, FutureCoinError::InvalidArg(_)));
}

#[test]
fn build_with_empty_symbol_set_fails() {
    let err = FutureCoin::builder()
        .with_connector(m_quote("q", "1"))
        .supported_symbols(vec![])
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, FutureCoinError::InvalidArg(_)));
}

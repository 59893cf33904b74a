use futurecoin::{FutureCoin, FutureCoinError, HistoryRequest, IntervalClass};

use crate::helpers::{BTC, MockConnector, XRP, m_hist, sym};

#[tokio::test]
async fn lookback_above_maximum_is_rejected_before_fetching() {
    let c = m_hist("c", IntervalClass::Daily, &["1"]);
    let fc = FutureCoin::builder().with_connector(c.clone()).build().unwrap();

    let req = HistoryRequest::new(IntervalClass::Daily, 61).unwrap();
    let err = fc
        .history_with_attribution(&sym(BTC), req)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "lookback_out_of_range");
    assert_eq!(c.calls(), 0);
}

#[tokio::test]
async fn unsupported_symbol_is_rejected_before_fetching() {
    let c = m_hist("c", IntervalClass::Daily, &["1"]);
    let fc = FutureCoin::builder()
        .with_connector(c.clone())
        .supported_symbols(vec![sym(BTC)])
        .build()
        .unwrap();

    let err = fc.history(&sym(XRP), IntervalClass::Daily).await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.code(), "unsupported_symbol");
    assert_eq!(c.calls(), 0);
}

#[tokio::test]
async fn all_not_found_collapses_to_not_found() {
    let a = MockConnector::builder()
        .name("a")
        .with_history_fn(|s, _| Err(FutureCoinError::not_found(format!("history for {s}"))))
        .build();
    let b = MockConnector::builder()
        .name("b")
        .with_history_fn(|s, req| {
            Ok(futurecoin::Dataset::empty(s.clone(), req.interval, futurecoin::Currency::Usd))
        })
        .build();

    let fc = FutureCoin::builder()
        .with_connector(a)
        .with_connector(b)
        .build()
        .unwrap();

    let err = fc.history(&sym(BTC), IntervalClass::Daily).await.unwrap_err();
    assert!(
        matches!(err, FutureCoinError::NotFound { ref what } if what == "history for BTC"),
        "{err:?}"
    );
}

#[tokio::test]
async fn mixed_failures_are_aggregated() {
    let a = MockConnector::builder()
        .name("a")
        .with_history_fn(|_, _| Err(FutureCoinError::connector("a", "boom")))
        .build();
    let b = MockConnector::builder()
        .name("b")
        .with_history_fn(|s, _| Err(FutureCoinError::not_found(format!("history for {s}"))))
        .build();

    let fc = FutureCoin::builder()
        .with_connector(a)
        .with_connector(b)
        .build()
        .unwrap();

    let err = fc.history(&sym(BTC), IntervalClass::Daily).await.unwrap_err();
    match err {
        FutureCoinError::AllProvidersFailed(errs) => assert_eq!(errs.len(), 2),
        other => panic!("unexpected: {other:?}"),
    }
}

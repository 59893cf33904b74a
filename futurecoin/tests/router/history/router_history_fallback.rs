use futurecoin::{Currency, Dataset, FutureCoin, FutureCoinError, HistoryRequest, IntervalClass};

use crate::helpers::{BTC, MockConnector, candle, dec, dt, m_hist, series, sym};

#[tokio::test]
async fn empty_primary_falls_back_to_next_provider() {
    let empty = MockConnector::builder()
        .name("empty")
        .with_history_fn(|s, req| Ok(Dataset::empty(s.clone(), req.interval, Currency::Usd)))
        .build();
    let full = m_hist("full", IntervalClass::Daily, &["1", "2", "3"]);

    let fc = FutureCoin::builder()
        .with_connector(empty.clone())
        .with_connector(full)
        .build()
        .unwrap();

    let req = HistoryRequest::new(IntervalClass::Daily, 10).unwrap();
    let (ds, attr) = fc.history_with_attribution(&sym(BTC), req).await.unwrap();
    assert_eq!(ds.len(), 3);
    assert_eq!(empty.calls(), 1);
    assert_eq!(attr.spans.len(), 1);
    assert_eq!(attr.spans[0].0, "full");
}

#[tokio::test]
async fn primary_wins_without_consulting_lower_priority() {
    let primary = m_hist("primary", IntervalClass::Daily, &["100", "101"]);
    let secondary = m_hist("secondary", IntervalClass::Daily, &["5", "6", "7"]);

    let fc = FutureCoin::builder()
        .with_connector(primary)
        .with_connector(secondary.clone())
        .build()
        .unwrap();

    let ds = fc.history(&sym(BTC), IntervalClass::Daily).await.unwrap();
    assert_eq!(ds.closes(), vec![dec("100"), dec("101")]);
    assert_eq!(secondary.calls(), 0);
}

#[tokio::test]
async fn failing_primary_falls_back() {
    let failing = MockConnector::builder()
        .name("failing")
        .with_history_fn(|_, _| Err(FutureCoinError::connector("failing", "502 bad gateway")))
        .build();
    let ok = m_hist("ok", IntervalClass::Daily, &["1"]);

    let fc = FutureCoin::builder()
        .with_connector(failing)
        .with_connector(ok)
        .build()
        .unwrap();

    let ds = fc.history(&sym(BTC), IntervalClass::Daily).await.unwrap();
    assert_eq!(ds.len(), 1);
}

#[tokio::test]
async fn connectors_without_the_interval_are_skipped() {
    const DAILY_ONLY: &[IntervalClass] = &[IntervalClass::Daily];
    let daily = MockConnector::builder()
        .name("daily")
        .with_history_intervals(DAILY_ONLY)
        .returns_history_ok(series(BTC, IntervalClass::Daily, &["1"]))
        .build();

    let fc = FutureCoin::builder().with_connector(daily.clone()).build().unwrap();

    let err = fc
        .history(&sym(BTC), IntervalClass::Hourly)
        .await
        .unwrap_err();
    assert!(matches!(err, FutureCoinError::Unsupported { .. }), "{err:?}");
    assert_eq!(daily.calls(), 0);
}

#[tokio::test]
async fn lookback_is_capped_per_connector() {
    let small = MockConnector::builder()
        .name("small")
        .max_lookback(5)
        .returns_history_ok(series(BTC, IntervalClass::Daily, &["1", "2", "3", "4", "5", "6", "7"]))
        .build();

    let fc = FutureCoin::builder().with_connector(small.clone()).build().unwrap();

    let req = HistoryRequest::new(IntervalClass::Daily, 30).unwrap();
    let (ds, _) = fc.history_with_attribution(&sym(BTC), req).await.unwrap();
    assert_eq!(ds.len(), 5);
    assert_eq!(
        small.last_lookback.load(std::sync::atomic::Ordering::SeqCst),
        5
    );
}

#[tokio::test]
async fn invalid_rows_are_dropped() {
    let bad = MockConnector::builder()
        .name("bad_rows")
        .with_history_fn(|s, req| {
            let mut broken = candle(BTC, dt(2024, 6, 2, 0), "10", Currency::Usd);
            broken.low = dec("11");
            let candles = vec![
                candle(BTC, dt(2024, 6, 1, 0), "10", Currency::Usd),
                broken,
                candle(BTC, dt(2024, 6, 3, 0), "12", Currency::Usd),
            ];
            Ok(Dataset::new(s.clone(), req.interval, Currency::Usd, candles))
        })
        .build();

    let fc = FutureCoin::builder().with_connector(bad).build().unwrap();
    let ds = fc.history(&sym(BTC), IntervalClass::Daily).await.unwrap();
    assert_eq!(ds.closes(), vec![dec("10"), dec("12")]);
}

#[tokio::test]
async fn all_rows_invalid_moves_to_next_provider() {
    let bad = MockConnector::builder()
        .name("all_bad")
        .with_history_fn(|s, req| {
            let mut broken = candle(BTC, dt(2024, 6, 2, 0), "10", Currency::Usd);
            broken.volume = dec("-1");
            Ok(Dataset::new(s.clone(), req.interval, Currency::Usd, vec![broken]))
        })
        .build();
    let ok = m_hist("ok", IntervalClass::Daily, &["3"]);

    let fc = FutureCoin::builder()
        .with_connector(bad)
        .with_connector(ok)
        .build()
        .unwrap();
    let ds = fc.history(&sym(BTC), IntervalClass::Daily).await.unwrap();
    assert_eq!(ds.closes(), vec![dec("3")]);
}

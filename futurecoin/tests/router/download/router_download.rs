use std::sync::Arc;
use std::time::Duration;

use futurecoin::{Currency, DatasetStore, FutureCoin, FutureCoinError, IntervalClass};
use futurecoin_mock::MockConnector as FixtureConnector;

use crate::helpers::{BTC, ETH, MockConnector, XRP, series, sym};

fn fixture_fc() -> FutureCoin {
    FutureCoin::builder()
        .with_connector(Arc::new(FixtureConnector::new()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn download_normalizes_persists_and_merges() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path());
    let fc = fixture_fc();

    let report = fc
        .download()
        .symbols(&[sym(BTC), sym(ETH)])
        .unwrap()
        .interval(IntervalClass::Daily)
        .target_currency(Currency::Inr)
        .store(store.clone())
        .run()
        .await
        .unwrap();

    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert_eq!(report.dropped_without_rate, 0);
    assert_eq!(report.datasets.len(), 2);
    assert!(report.datasets.iter().all(|d| d.currency() == Currency::Inr));
    assert!(report.datasets.iter().all(|d| d.len() == 60));

    let merged = report.merged.as_ref().unwrap();
    assert_eq!(merged.len(), 120);
    let keys: Vec<_> = merged
        .rows()
        .iter()
        .map(|c| (c.ts, c.symbol.clone()))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);

    assert_eq!(report.files.len(), 3);
    assert!(store.merged_path(IntervalClass::Daily).exists());
    let btc = store.read(&sym(BTC), IntervalClass::Daily).unwrap().unwrap();
    assert_eq!(btc.currency(), Currency::Inr);
    assert_eq!(btc.len(), 60);
}

#[tokio::test]
async fn download_is_idempotent_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path());
    let fc = fixture_fc();

    for _ in 0..2 {
        fc.download()
            .symbols(&[sym(BTC)])
            .unwrap()
            .interval(IntervalClass::Hourly)
            .lookback(24)
            .store(store.clone())
            .run()
            .await
            .unwrap();
    }
    let btc = store.read(&sym(BTC), IntervalClass::Hourly).unwrap().unwrap();
    assert_eq!(btc.len(), 24);
}

#[tokio::test]
async fn per_symbol_failures_become_warnings() {
    let fc = fixture_fc();

    let report = fc
        .download()
        .symbols(&[sym(BTC), sym(XRP)])
        .unwrap()
        .dry_run()
        .run()
        .await
        .unwrap();

    assert_eq!(report.datasets.len(), 1);
    assert_eq!(report.warnings.len(), 1);
    assert!(matches!(report.warnings[0], FutureCoinError::NotFound { .. }));
    assert!(report.files.is_empty());
}

#[tokio::test]
async fn missing_rates_drop_datasets_with_warnings() {
    let hist_only = MockConnector::builder()
        .name("hist_only")
        .returns_history_ok(series(BTC, IntervalClass::Daily, &["1", "2"]))
        .build();
    let fc = FutureCoin::builder().with_connector(hist_only).build().unwrap();

    let report = fc
        .download()
        .symbols(&[sym(BTC), sym(ETH)])
        .unwrap()
        .target_currency(Currency::Inr)
        .run()
        .await
        .unwrap();

    assert!(report.datasets.is_empty());
    assert!(report.merged.is_none());
    // One for the rate lookup, one per dataset that could not be converted.
    assert_eq!(report.warnings.len(), 3);
}

#[tokio::test]
async fn pegged_target_needs_no_rates() {
    let fc = fixture_fc();
    let report = fc
        .download()
        .symbols(&[sym(BTC)])
        .unwrap()
        .interval(IntervalClass::Hourly)
        .target_currency(Currency::Usdt)
        .run()
        .await
        .unwrap();

    assert!(report.warnings.is_empty());
    assert_eq!(report.datasets[0].currency(), Currency::Usdt);
}

#[tokio::test]
async fn duplicate_and_empty_symbol_lists_are_rejected() {
    let fc = fixture_fc();

    let dup = fc.download().symbols(&[sym(BTC), sym(BTC)]);
    assert!(matches!(dup.err(), Some(FutureCoinError::InvalidArg(_))));

    let dup = fc
        .download()
        .add_symbol(sym(ETH))
        .unwrap()
        .add_symbol(sym(ETH));
    assert!(matches!(dup.err(), Some(FutureCoinError::InvalidArg(_))));

    let err = fc.download().run().await.unwrap_err();
    assert!(matches!(err, FutureCoinError::InvalidArg(_)));
}

#[tokio::test]
async fn request_deadline_bounds_the_download() {
    let slow = MockConnector::builder()
        .name("slow")
        .delay(Duration::from_millis(300))
        .returns_history_ok(series(BTC, IntervalClass::Daily, &["1"]))
        .build();
    let fc = FutureCoin::builder()
        .with_connector(slow)
        .provider_timeout(Duration::from_secs(5))
        .request_timeout(Duration::from_millis(30))
        .build()
        .unwrap();

    let err = fc
        .download()
        .symbols(&[sym(BTC)])
        .unwrap()
        .run()
        .await
        .unwrap_err();
    assert!(
        matches!(err, FutureCoinError::RequestTimeout { ref capability } if capability == "download:history"),
        "{err:?}"
    );
}

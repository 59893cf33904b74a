use futurecoin::{FutureCoin, FutureCoinError};

use crate::helpers::{BTC, ETH, MockConnector, SOL, dec, m_quote, sym};

#[tokio::test]
async fn quote_not_found_everywhere_is_not_found() {
    let a = MockConnector::builder()
        .name("a")
        .with_quote_fn(|s| Err(FutureCoinError::not_found(format!("quote for {s}"))))
        .build();

    let fc = FutureCoin::builder().with_connector(a).build().unwrap();
    let err = fc.spot_price(&sym(BTC)).await.unwrap_err();
    assert!(
        matches!(err, FutureCoinError::NotFound { ref what } if what == "quote for BTC"),
        "{err:?}"
    );
}

#[tokio::test]
async fn spot_prices_splits_successes_and_failures() {
    let a = MockConnector::builder()
        .name("a")
        .with_quote_fn(|s| {
            if s.as_str() == "SOL" {
                Err(FutureCoinError::not_found(format!("quote for {s}")))
            } else {
                Ok(futurecoin::SpotPrice {
                    symbol: s.clone(),
                    price: dec("5"),
                    currency: futurecoin::Currency::Usd,
                    as_of: crate::helpers::dt(2024, 6, 30, 0),
                })
            }
        })
        .build();

    let fc = FutureCoin::builder().with_connector(a).build().unwrap();
    let (ok, failed) = fc.spot_prices(&[sym(BTC), sym(ETH), sym(SOL)]).await;
    assert_eq!(ok.len(), 2);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, sym(SOL));
}

#[tokio::test]
async fn quote_for_unsupported_symbol_is_rejected() {
    let q = m_quote("q", "1");
    let fc = FutureCoin::builder()
        .with_connector(q.clone())
        .supported_symbols(vec![sym(BTC)])
        .build()
        .unwrap();

    let err = fc.spot_price(&sym(ETH)).await.unwrap_err();
    assert_eq!(err.code(), "unsupported_symbol");
    assert_eq!(q.calls(), 0);
}

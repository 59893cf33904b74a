use futurecoin::{Currency, FutureCoin, FutureCoinError, RateTable};

use crate::helpers::{MockConnector, dec, inr_table, m_rates};

#[tokio::test]
async fn rates_come_from_first_provider_supporting_the_pair() {
    let fc = FutureCoin::builder()
        .with_connector(m_rates("fx", "83.5"))
        .build()
        .unwrap();

    let table = fc.exchange_rates(Currency::Usd, Currency::Inr, 10).await.unwrap();
    assert_eq!(table.base(), Currency::Usd);
    assert_eq!(table.quote(), Currency::Inr);
    assert_eq!(table.latest().unwrap().rate, dec("83.5"));
}

#[tokio::test]
async fn unsupported_pair_is_unsupported() {
    let fx = m_rates("fx", "83.5");
    let fc = FutureCoin::builder().with_connector(fx.clone()).build().unwrap();

    let err = fc
        .exchange_rates(Currency::Inr, Currency::Usd, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, FutureCoinError::Unsupported { .. }), "{err:?}");
    assert_eq!(fx.calls(), 0);
}

#[tokio::test]
async fn empty_table_falls_back_to_next_provider() {
    let empty = MockConnector::builder()
        .name("empty")
        .returns_rates_ok(RateTable::new(Currency::Usd, Currency::Inr, vec![]))
        .build();
    let full = MockConnector::builder()
        .name("full")
        .returns_rates_ok(inr_table("82", 5))
        .build();

    let fc = FutureCoin::builder()
        .with_connector(empty)
        .with_connector(full)
        .build()
        .unwrap();

    let table = fc.exchange_rates(Currency::Usd, Currency::Inr, 5).await.unwrap();
    assert_eq!(table.samples().len(), 5);
}

#[tokio::test]
async fn zero_days_is_invalid() {
    let fc = FutureCoin::builder()
        .with_connector(m_rates("fx", "83"))
        .build()
        .unwrap();
    let err = fc
        .exchange_rates(Currency::Usd, Currency::Inr, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, FutureCoinError::InvalidArg(_)));
}

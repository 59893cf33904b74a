use std::sync::Arc;

use futurecoin::{FutureCoin, PredictionRequest};
use futurecoin_mock::MockConnector as FixtureConnector;
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::helpers::sym;

proptest! {
    #![proptest_config(ProptestConfig { cases: 40, .. ProptestConfig::default() })]
    #[test]
    fn predictions_match_requested_horizons(
        days in 0u32..=30,
        hours in 0u32..=23,
        cents in 1i64..=100_000_000,
        symbol in prop::sample::select(vec!["BTC", "ETH", "SOL", "ADA"]),
    ) {
        tokio_test::block_on(async move {
            let fc = FutureCoin::builder()
                .with_connector(Arc::new(FixtureConnector::new()))
                .build()
                .unwrap();
            let req = PredictionRequest::new(sym(symbol), days, hours)
                .with_current_price(Decimal::new(cents, 2));

            let first = fc.predict(req.clone()).await;
            if days == 0 && hours == 0 {
                assert_eq!(first.unwrap_err().code(), "empty_horizon");
                return;
            }
            let first = first.unwrap();
            assert_eq!(first.daily_prediction.is_some(), days > 0);
            assert_eq!(first.hourly_prediction.is_some(), hours > 0);
            for p in first.daily_prediction.iter().chain(first.hourly_prediction.iter()) {
                assert!(p.predicted_price >= Decimal::ZERO);
                assert!((0.0..=1.0).contains(&p.confidence));
            }

            let second = fc.predict(req).await.unwrap();
            assert_eq!(first.daily_prediction, second.daily_prediction);
            assert_eq!(first.hourly_prediction, second.hourly_prediction);
        });
    }
}

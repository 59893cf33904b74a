use std::sync::Arc;

use futurecoin::{
    Currency, FallbackKind, FutureCoin, FutureCoinError, Horizon, IntervalClass,
    LinearSequenceModel, ModelRegistry, PredictionRequest,
};
use futurecoin_mock::{DynamicMockConnector, MockConnector as FixtureConnector};

use crate::helpers::{BTC, ETH, MockConnector, XRP, dec, inr_table, series, sym};

fn fixture_fc() -> FutureCoin {
    FutureCoin::builder()
        .with_connector(Arc::new(FixtureConnector::new()))
        .build()
        .unwrap()
}

/// History of three daily closes, flat 83 INR rates, no quotes.
fn small_world(fallback: FallbackKind) -> FutureCoin {
    let c = MockConnector::builder()
        .name("small")
        .returns_history_ok(series(BTC, IntervalClass::Daily, &["100", "110", "120"]))
        .returns_rates_ok(inr_table("83", 90))
        .build();
    FutureCoin::builder()
        .with_connector(c)
        .fallback(fallback)
        .build()
        .unwrap()
}

/// Model that repeats the last observation of a `len`-long window.
fn echo_model(len: usize) -> Arc<LinearSequenceModel> {
    let mut weights = vec![0.0; len];
    weights[len - 1] = 1.0;
    Arc::new(
        LinearSequenceModel::new("lstm", sym(BTC), IntervalClass::Daily, weights, 0.0, 0.8)
            .unwrap()
            .with_accuracy(0.9),
    )
}

#[tokio::test]
async fn btc_daily_with_price_override() {
    let fc = fixture_fc();
    let req = PredictionRequest::new(sym(BTC), 1, 0).with_current_price(dec("50000"));

    let res = fc.predict(req).await.unwrap();
    assert_eq!(res.symbol, sym(BTC));
    assert_eq!(res.current_price, dec("50000"));
    assert!(res.hourly_prediction.is_none());

    let daily = res.daily_prediction.unwrap();
    assert!(daily.predicted_price > rust_decimal::Decimal::ZERO);
    assert_eq!(daily.horizon, Horizon::DaysAhead(1));
    assert_eq!(daily.currency, Currency::Inr);
    assert_eq!(daily.model_type, "fallback");
    assert!((0.7..=1.0).contains(&daily.confidence));
    assert!(daily.accuracy.is_none());
}

#[tokio::test]
async fn both_horizons_use_their_own_currency() {
    let fc = fixture_fc();
    let req = PredictionRequest::new(sym(ETH), 3, 6).with_current_price(dec("3000"));

    let res = fc.predict(req).await.unwrap();
    let daily = res.daily_prediction.unwrap();
    let hourly = res.hourly_prediction.unwrap();
    assert_eq!(daily.currency, Currency::Inr);
    assert_eq!(hourly.currency, Currency::Usdt);
    assert_eq!(hourly.horizon, Horizon::HoursAhead(6));
    assert!((0.8..=1.0).contains(&hourly.confidence));
}

#[tokio::test]
async fn empty_horizon_is_rejected_without_provider_calls() {
    let (conn, controller) = DynamicMockConnector::new_with_controller("dyn");
    let fc = FutureCoin::builder().with_connector(conn).build().unwrap();

    let err = fc
        .predict(PredictionRequest::new(sym(XRP), 0, 0))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "empty_horizon");
    assert_eq!(controller.calls(), 0);
}

#[tokio::test]
async fn negative_price_is_rejected_without_provider_calls() {
    let (conn, controller) = DynamicMockConnector::new_with_controller("dyn");
    let fc = FutureCoin::builder().with_connector(conn).build().unwrap();

    let req = PredictionRequest::new(sym(BTC), 1, 0).with_current_price(dec("-5"));
    let err = fc.predict(req).await.unwrap_err();
    assert_eq!(err.code(), "invalid_price");
    assert_eq!(controller.calls(), 0);
}

#[tokio::test]
async fn horizons_beyond_limits_are_rejected() {
    let fc = fixture_fc();

    let err = fc
        .predict(PredictionRequest::new(sym(BTC), 31, 0))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "days_out_of_range");

    let err = fc
        .predict(PredictionRequest::new(sym(BTC), 0, 24))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "hours_out_of_range");
}

#[tokio::test]
async fn unsupported_symbol_is_rejected_without_provider_calls() {
    let (conn, controller) = DynamicMockConnector::new_with_controller("dyn");
    let fc = FutureCoin::builder()
        .with_connector(conn)
        .supported_symbols(vec![sym(BTC)])
        .build()
        .unwrap();

    let err = fc
        .predict(PredictionRequest::new(sym(ETH), 1, 0))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "unsupported_symbol");
    assert_eq!(controller.calls(), 0);
}

#[tokio::test]
async fn seeded_fallback_is_deterministic() {
    let fc = fixture_fc();
    let req = PredictionRequest::new(sym(BTC), 5, 12).with_current_price(dec("50000"));

    let a = fc.predict(req.clone()).await.unwrap();
    let b = fc.predict(req).await.unwrap();
    assert_eq!(a.daily_prediction, b.daily_prediction);
    assert_eq!(a.hourly_prediction, b.hourly_prediction);
}

#[tokio::test]
async fn model_prediction_runs_over_converted_history() {
    let fc = small_world(FallbackKind::LastValue);
    fc.replace_models(ModelRegistry::empty().with_model(sym(BTC), IntervalClass::Daily, echo_model(3)))
        .await;

    let req = PredictionRequest::new(sym(BTC), 2, 0).with_current_price(dec("50000"));
    let daily = fc.predict(req).await.unwrap().daily_prediction.unwrap();
    assert_eq!(daily.model_type, "daily_lstm");
    assert_eq!(daily.currency, Currency::Inr);
    assert_eq!(daily.predicted_price, dec("9960"));
    assert!((daily.confidence - 0.8).abs() < f64::EPSILON);
    assert_eq!(daily.accuracy, Some(0.9));
}

#[tokio::test]
async fn model_runs_over_usdt_history() {
    let usd = series(BTC, IntervalClass::Daily, &["100", "110", "120"]);
    let usdt = futurecoin::Dataset::new(
        sym(BTC),
        IntervalClass::Daily,
        Currency::Usdt,
        usd.candles()
            .iter()
            .map(|c| futurecoin::Candle {
                currency: Currency::Usdt,
                ..c.clone()
            })
            .collect(),
    );
    let c = MockConnector::builder()
        .name("usdt_exchange")
        .native_currency(Currency::Usdt)
        .returns_history_ok(usdt)
        .returns_rates_ok(inr_table("83", 90))
        .build();
    let fc = FutureCoin::builder()
        .with_connector(c)
        .fallback(FallbackKind::LastValue)
        .models(ModelRegistry::empty().with_model(sym(BTC), IntervalClass::Daily, echo_model(3)))
        .build()
        .unwrap();

    let req = PredictionRequest::new(sym(BTC), 1, 0).with_current_price(dec("50000"));
    let daily = fc.predict(req).await.unwrap().daily_prediction.unwrap();
    assert_eq!(daily.model_type, "daily_lstm");
    assert_eq!(daily.predicted_price, dec("9960"));
}

#[tokio::test]
async fn model_with_insufficient_history_falls_back() {
    let fc = FutureCoin::builder()
        .with_connector(
            MockConnector::builder()
                .name("small")
                .returns_history_ok(series(BTC, IntervalClass::Daily, &["100", "110", "120"]))
                .returns_rates_ok(inr_table("83", 90))
                .build(),
        )
        .fallback(FallbackKind::LastValue)
        .models(ModelRegistry::empty().with_model(sym(BTC), IntervalClass::Daily, echo_model(10)))
        .build()
        .unwrap();

    let req = PredictionRequest::new(sym(BTC), 1, 0).with_current_price(dec("100"));
    let daily = fc.predict(req).await.unwrap().daily_prediction.unwrap();
    assert_eq!(daily.model_type, "fallback_last_value");
    assert_eq!(daily.predicted_price, dec("8300"));
    assert!(daily.accuracy.is_none());
}

#[tokio::test]
async fn model_history_failure_falls_back() {
    let c = MockConnector::builder()
        .name("no_history")
        .with_history_fn(|_, _| Err(FutureCoinError::connector("no_history", "down")))
        .returns_rates_ok(inr_table("83", 90))
        .build();
    let fc = FutureCoin::builder()
        .with_connector(c)
        .fallback(FallbackKind::LastValue)
        .models(ModelRegistry::empty().with_model(sym(BTC), IntervalClass::Daily, echo_model(3)))
        .build()
        .unwrap();

    let req = PredictionRequest::new(sym(BTC), 1, 0).with_current_price(dec("1"));
    let daily = fc.predict(req).await.unwrap().daily_prediction.unwrap();
    assert_eq!(daily.model_type, "fallback_last_value");
    assert_eq!(daily.predicted_price, dec("83"));
}

#[tokio::test]
async fn basis_comes_from_spot_price_without_override() {
    let c = MockConnector::builder()
        .name("quotes")
        .returns_quote_ok(dec("200"))
        .returns_rates_ok(inr_table("83", 90))
        .build();
    let fc = FutureCoin::builder()
        .with_connector(c)
        .fallback(FallbackKind::LastValue)
        .build()
        .unwrap();

    let res = fc
        .predict(PredictionRequest::new(sym(BTC), 1, 1))
        .await
        .unwrap();
    assert_eq!(res.current_price, dec("200"));
    assert_eq!(res.daily_prediction.unwrap().predicted_price, dec("16600"));
    assert_eq!(res.hourly_prediction.unwrap().predicted_price, dec("200"));
}

#[tokio::test]
async fn basis_falls_back_to_last_close() {
    let c = MockConnector::builder()
        .name("history_only")
        .returns_history_ok(series(BTC, IntervalClass::Hourly, &["7", "8", "9"]))
        .build();
    let fc = FutureCoin::builder()
        .with_connector(c.clone())
        .fallback(FallbackKind::LastValue)
        .build()
        .unwrap();

    let res = fc
        .predict(PredictionRequest::new(sym(BTC), 0, 3))
        .await
        .unwrap();
    assert_eq!(res.current_price, dec("9"));
    assert_eq!(res.hourly_prediction.unwrap().predicted_price, dec("9"));
    // The hourly history is fetched once for the basis and reused.
    assert_eq!(c.calls(), 1);
}

#[tokio::test]
async fn missing_basis_is_not_found() {
    let c = MockConnector::builder()
        .name("nothing")
        .with_quote_fn(|s| Err(FutureCoinError::not_found(format!("quote for {s}"))))
        .with_history_fn(|s, _| Err(FutureCoinError::not_found(format!("history for {s}"))))
        .build();
    let fc = FutureCoin::builder().with_connector(c).build().unwrap();

    let err = fc
        .predict(PredictionRequest::new(sym(BTC), 0, 1))
        .await
        .unwrap_err();
    assert!(
        matches!(err, FutureCoinError::NotFound { ref what } if what == "basis price for BTC"),
        "{err:?}"
    );
}

#[tokio::test]
async fn rate_outage_still_answers_the_hourly_horizon() {
    let c = MockConnector::builder()
        .name("rates_down")
        .with_rates_fn(|_| Err(FutureCoinError::connector("rates_down", "HTTP 503")))
        .build();
    let fc = FutureCoin::builder()
        .with_connector(c)
        .fallback(FallbackKind::LastValue)
        .build()
        .unwrap();

    let req = PredictionRequest::new(sym(BTC), 1, 1).with_current_price(dec("50000"));
    let res = fc.predict(req).await.unwrap();

    let hourly = res.hourly_prediction.unwrap();
    assert_eq!(hourly.currency, Currency::Usdt);
    assert_eq!(hourly.predicted_price, dec("50000"));
    assert!(res.hourly_error.is_none());

    assert!(res.daily_prediction.is_none());
    let daily_err = res.daily_error.unwrap();
    assert_eq!(daily_err.code, "all_providers_failed");
    assert!(daily_err.message.contains("HTTP 503"), "{}", daily_err.message);
}

#[tokio::test]
async fn daily_only_request_without_rates_fails() {
    let c = MockConnector::builder()
        .name("no_rates")
        .returns_quote_ok(dec("10"))
        .build();
    let fc = FutureCoin::builder().with_connector(c).build().unwrap();

    let err = fc
        .predict(PredictionRequest::new(sym(BTC), 1, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, FutureCoinError::Unsupported { .. }), "{err:?}");
}

#[tokio::test]
async fn linear_trend_fallback_extrapolates_history() {
    let fc = small_world(FallbackKind::LinearTrend);

    // Closes 100, 110, 120 USD are 8300, 9130, 9960 INR: slope 830 per day.
    let req = PredictionRequest::new(sym(BTC), 2, 0).with_current_price(dec("120"));
    let daily = fc.predict(req).await.unwrap().daily_prediction.unwrap();
    assert_eq!(daily.model_type, "fallback_linear_trend");
    assert_eq!(daily.predicted_price, dec("11620"));
    assert!((daily.confidence - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn registry_swap_is_visible_to_later_requests() {
    let fc = small_world(FallbackKind::LastValue);
    let req = PredictionRequest::new(sym(BTC), 1, 0).with_current_price(dec("1"));

    let before = fc.predict(req.clone()).await.unwrap().daily_prediction.unwrap();
    assert_eq!(before.model_type, "fallback_last_value");

    fc.replace_models(ModelRegistry::empty().with_model(sym(BTC), IntervalClass::Daily, echo_model(3)))
        .await;
    let after = fc.predict(req).await.unwrap().daily_prediction.unwrap();
    assert_eq!(after.model_type, "daily_lstm");
    assert_eq!(fc.models().await.status().loaded, 1);
}

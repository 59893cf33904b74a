use futurecoin_core::{
    FallbackEstimator, FallbackInput, FallbackKind, IntervalClass, LastValue, LinearTrend,
    SeededNoise, Symbol, estimator_for,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

fn input<'a>(symbol: &'a Symbol, interval: IntervalClass, steps: u32, basis: Decimal, closes: &'a [Decimal]) -> FallbackInput<'a> {
    FallbackInput { symbol, interval, steps, basis, closes }
}

#[test]
fn seeded_noise_is_repeatable_and_seed_sensitive() {
    let btc = Symbol::new("BTC").unwrap();
    let basis = Decimal::new(50_000, 0);
    let i = input(&btc, IntervalClass::Daily, 1, basis, &[]);
    let a = SeededNoise::new(7).estimate(&i);
    let b = SeededNoise::new(7).estimate(&i);
    assert_eq!(a, b);
    assert!(a.predicted > Decimal::ZERO);

    let others: Vec<_> = (0..8u64).map(|s| SeededNoise::new(s).estimate(&i).predicted).collect();
    assert!(others.iter().any(|p| *p != others[0]));
}

#[test]
fn last_value_returns_basis() {
    let btc = Symbol::new("BTC").unwrap();
    let e = LastValue.estimate(&input(&btc, IntervalClass::Hourly, 3, Decimal::new(123, 0), &[]));
    assert_eq!(e.predicted, Decimal::new(123, 0));
    assert!((e.confidence - 0.5).abs() < f64::EPSILON);
}

#[test]
fn linear_trend_extrapolates_from_basis() {
    let btc = Symbol::new("BTC").unwrap();
    let closes: Vec<Decimal> = (0..10).map(|i| Decimal::new(100 + 2 * i, 0)).collect();
    let e = LinearTrend.estimate(&input(&btc, IntervalClass::Daily, 5, Decimal::new(120, 0), &closes));
    assert!((e.predicted.to_f64().unwrap() - 130.0).abs() < 1e-6);
    assert!((e.confidence - 1.0).abs() < 1e-9);

    let short = [Decimal::new(5, 0)];
    let e = LinearTrend.estimate(&input(&btc, IntervalClass::Daily, 5, Decimal::new(9, 0), &short));
    assert_eq!(e.predicted, Decimal::new(9, 0));
}

#[test]
fn linear_trend_never_goes_negative() {
    let btc = Symbol::new("BTC").unwrap();
    let closes: Vec<Decimal> = (0..10).map(|i| Decimal::new(1_000 - 100 * i, 0)).collect();
    let e = LinearTrend.estimate(&input(&btc, IntervalClass::Daily, 30, Decimal::new(100, 0), &closes));
    assert_eq!(e.predicted, Decimal::ZERO);
}

#[test]
fn configured_kind_selects_estimator() {
    assert_eq!(estimator_for(FallbackKind::LastValue).name(), "fallback_last_value");
    assert_eq!(estimator_for(FallbackKind::LinearTrend).name(), "fallback_linear_trend");
    assert_eq!(estimator_for(FallbackKind::default()).name(), "fallback");
}

proptest! {
    #[test]
    fn seeded_noise_stays_within_bands(seed in any::<u64>(), basis in 1i64..10_000_000, steps in 1u32..=30, hourly in any::<bool>()) {
        let btc = Symbol::new("BTC").unwrap();
        let interval = if hourly { IntervalClass::Hourly } else { IntervalClass::Daily };
        let (max_move, min_conf) = if hourly { (0.05 + 0.06, 0.80) } else { (0.10 + 0.15, 0.70) };
        let basis = Decimal::new(basis, 0);
        let e = SeededNoise::new(seed).estimate(&input(&btc, interval, steps, basis, &[]));
        let ratio = e.predicted.to_f64().unwrap() / basis.to_f64().unwrap();
        prop_assert!(ratio >= 1.0 - max_move - 1e-6 && ratio <= 1.0 + max_move + 1e-6);
        prop_assert!(e.confidence >= min_conf && e.confidence <= 1.0);
    }
}

//! Fallback estimators used when no trained model can serve a request.
//!
//! Every estimator is a pure function of its input, so identical requests
//! always produce identical estimates.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use futurecoin_types::{FallbackKind, IntervalClass, Symbol};

/// Everything a fallback estimator may look at.
#[derive(Debug, Clone, Copy)]
pub struct FallbackInput<'a> {
    /// Asset being predicted.
    pub symbol: &'a Symbol,
    /// Interval class of the horizon.
    pub interval: IntervalClass,
    /// Number of intervals ahead.
    pub steps: u32,
    /// Basis price in the output currency.
    pub basis: Decimal,
    /// Recent closes in the output currency, oldest first; may be empty.
    pub closes: &'a [Decimal],
}

/// Point estimate and confidence produced by a fallback estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Predicted price, never negative.
    pub predicted: Decimal,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

/// A deterministic estimator standing in for a trained model.
pub trait FallbackEstimator: Send + Sync {
    /// Label reported as `model_type` in predictions.
    fn name(&self) -> &'static str;

    /// Produce an estimate for `input`.
    fn estimate(&self, input: &FallbackInput<'_>) -> Estimate;

    /// Whether `estimate` reads `closes`; when false callers may skip fetching history.
    fn needs_history(&self) -> bool {
        false
    }
}

/// Build the estimator selected by configuration.
#[must_use]
pub fn estimator_for(kind: FallbackKind) -> Arc<dyn FallbackEstimator> {
    match kind {
        FallbackKind::SeededNoise { seed } => Arc::new(SeededNoise::new(seed)),
        FallbackKind::LastValue => Arc::new(LastValue),
        FallbackKind::LinearTrend => Arc::new(LinearTrend),
    }
}

struct NoiseBands {
    trend: f64,
    volatility: (f64, f64),
    confidence: (f64, f64),
}

const fn bands(interval: IntervalClass) -> NoiseBands {
    match interval {
        IntervalClass::Daily => NoiseBands {
            trend: 0.10,
            volatility: (0.05, 0.15),
            confidence: (0.70, 1.00),
        },
        IntervalClass::Hourly => NoiseBands {
            trend: 0.05,
            volatility: (0.01, 0.06),
            confidence: (0.80, 1.00),
        },
    }
}

/// Bounded random trend plus volatility noise from a seeded generator.
///
/// `predicted = max(0, basis * (1 + trend + volatility * noise))` with
/// `noise` uniform in `[-1, 1]`. The generator is seeded from the base seed,
/// symbol, interval class and step count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededNoise {
    seed: u64,
}

impl SeededNoise {
    /// Estimator with the given base seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn rng_for(&self, input: &FallbackInput<'_>) -> StdRng {
        // FNV-1a; std's hasher is not stable across releases.
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        let mut feed = |bytes: &[u8]| {
            for b in bytes {
                h ^= u64::from(*b);
                h = h.wrapping_mul(0x0000_0100_0000_01b3);
            }
        };
        feed(&self.seed.to_le_bytes());
        feed(input.symbol.as_str().as_bytes());
        feed(input.interval.as_str().as_bytes());
        feed(&input.steps.to_le_bytes());
        StdRng::seed_from_u64(h)
    }
}

impl FallbackEstimator for SeededNoise {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn estimate(&self, input: &FallbackInput<'_>) -> Estimate {
        let b = bands(input.interval);
        let mut rng = self.rng_for(input);
        let trend = rng.random_range(-b.trend..=b.trend);
        let volatility = rng.random_range(b.volatility.0..=b.volatility.1);
        let noise = rng.random_range(-1.0..=1.0);
        let confidence = rng.random_range(b.confidence.0..=b.confidence.1);
        let factor = 1.0 + trend + volatility * noise;
        Estimate {
            predicted: scale_non_negative(input.basis, factor),
            confidence,
        }
    }
}

/// Naive baseline: the price stays where it is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LastValue;

impl FallbackEstimator for LastValue {
    fn name(&self) -> &'static str {
        "fallback_last_value"
    }

    fn estimate(&self, input: &FallbackInput<'_>) -> Estimate {
        Estimate {
            predicted: input.basis.max(Decimal::ZERO),
            confidence: 0.5,
        }
    }
}

/// Least-squares line over recent closes, extrapolated from the basis price.
///
/// Confidence is the fit's R². With fewer than two closes this behaves like
/// [`LastValue`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinearTrend;

impl FallbackEstimator for LinearTrend {
    fn name(&self) -> &'static str {
        "fallback_linear_trend"
    }

    fn needs_history(&self) -> bool {
        true
    }

    fn estimate(&self, input: &FallbackInput<'_>) -> Estimate {
        let ys: Vec<f64> = input.closes.iter().filter_map(ToPrimitive::to_f64).collect();
        let Some((slope, r2)) = least_squares(&ys) else {
            return LastValue.estimate(input);
        };
        let basis = input.basis.to_f64().unwrap_or(0.0);
        let predicted = slope.mul_add(f64::from(input.steps), basis);
        Estimate {
            predicted: Decimal::from_f64(predicted.max(0.0))
                .unwrap_or(Decimal::ZERO)
                .round_dp(8),
            confidence: r2.clamp(0.0, 1.0),
        }
    }
}

/// Slope and R² of `ys` regressed on their index.
fn least_squares(ys: &[f64]) -> Option<(f64, f64)> {
    if ys.len() < 2 {
        return None;
    }
    let n = ys.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = ys.iter().sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (i, y) in ys.iter().enumerate() {
        let dx = i as f64 - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let slope = sxy / sxx;
    let r2 = if syy <= f64::EPSILON {
        1.0
    } else {
        (sxy * sxy) / (sxx * syy)
    };
    Some((slope, r2))
}

fn scale_non_negative(basis: Decimal, factor: f64) -> Decimal {
    let f = Decimal::from_f64(factor.max(0.0)).unwrap_or(Decimal::ONE);
    (basis * f).max(Decimal::ZERO).round_dp(8)
}

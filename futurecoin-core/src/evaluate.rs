//! Accuracy of past predictions against realized prices.

use futurecoin_types::AccuracyMetrics;

/// Absolute and absolute-percentage error of one prediction.
///
/// A zero `actual` has no meaningful relative error; `ape` is reported as 100.
#[must_use]
pub fn evaluate_accuracy(predicted: f64, actual: f64) -> AccuracyMetrics {
    let mae = (predicted - actual).abs();
    let ape = if actual == 0.0 {
        100.0
    } else {
        mae / actual.abs() * 100.0
    };
    AccuracyMetrics { mae, ape }
}

/// Mean metrics over `(predicted, actual)` pairs; `None` for no pairs.
#[must_use]
pub fn mean_accuracy<I>(pairs: I) -> Option<AccuracyMetrics>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let (mut n, mut mae, mut ape) = (0usize, 0.0, 0.0);
    for (p, a) in pairs {
        let m = evaluate_accuracy(p, a);
        n += 1;
        mae += m.mae;
        ape += m.ape;
    }
    (n > 0).then(|| {
        let n = n as f64;
        AccuracyMetrics {
            mae: mae / n,
            ape: ape / n,
        }
    })
}

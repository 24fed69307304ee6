//! Shared rolling-window and recursive helpers for indicator calculations.
//!
//! Rolling helpers return one entry per input value. An entry is `None` until
//! the window fills, and also whenever the window contains a NaN.

/// Apply `reduce` to each trailing window of `period` values.
fn rolling<F>(values: &[f64], period: usize, reduce: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    if period == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            if window.iter().any(|v| v.is_nan()) {
                None
            } else {
                Some(reduce(window))
            }
        })
        .collect()
}

pub fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). Undefined for windows
/// shorter than two values.
pub fn rolling_sample_std(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period < 2 {
        return vec![None; values.len()];
    }
    rolling(values, period, |w| {
        let n = w.len() as f64;
        let mean = w.iter().sum::<f64>() / n;
        let variance = w.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        variance.sqrt()
    })
}

pub fn rolling_min(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

pub fn rolling_max(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |w| {
        w.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

/// Recursive EMA with alpha = 2/(span+1), seeded from the first value.
///
/// EMA[0] = x[0], EMA[i] = alpha*x[i] + (1-alpha)*EMA[i-1]. Defined at every index.
pub fn ema_values(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;

    for &x in values {
        let next = match prev {
            None => x,
            Some(p) => alpha * x + (1.0 - alpha) * p,
        };
        out.push(next);
        prev = Some(next);
    }

    out
}

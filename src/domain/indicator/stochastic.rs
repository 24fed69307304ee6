//! Stochastic Oscillator.
//!
//! %K = 100 * (C - lowest_low(n)) / (highest_high(n) - lowest_low(n))
//! %D = simple mean of %K over d bars
//!
//! A flat window (highest_high == lowest_low) leaves %K undefined (NaN) and
//! the point invalid; any %D window touching it is invalid too.
//! Warmup: %K needs n bars, %D needs n + d - 1.

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::indicator_helpers::{rolling_max, rolling_mean, rolling_min};

pub const DEFAULT_K_PERIOD: usize = 14;
pub const DEFAULT_D_PERIOD: usize = 3;

pub fn calculate_stochastic(candles: &[Candle], k_period: usize, d_period: usize) -> IndicatorSeries {
    let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
    let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
    let lowest = rolling_min(&lows, k_period);
    let highest = rolling_max(&highs, k_period);

    let k_values: Vec<f64> = candles
        .iter()
        .enumerate()
        .map(|(i, candle)| match (lowest[i], highest[i]) {
            (Some(lo), Some(hi)) if hi > lo => 100.0 * (candle.close - lo) / (hi - lo),
            _ => f64::NAN,
        })
        .collect();
    let d_values = rolling_mean(&k_values, d_period);

    let values = candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            let k = k_values[i];
            let d = d_values[i].unwrap_or(f64::NAN);
            IndicatorPoint {
                timestamp: candle.timestamp,
                valid: !k.is_nan() && !d.is_nan(),
                value: IndicatorValue::Stochastic { k, d },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Stochastic { k_period, d_period },
        values,
    }
}

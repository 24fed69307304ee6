//! Standard Deviation indicator.
//!
//! Sample standard deviation over n closing prices.
//! STDDEV(n)[i] = sqrt(sum((C[i-j] - SMA(n)[i])^2 for j in 0..n-1) / (n - 1))
//! Warmup: first (n-1) bars are invalid; n < 2 is never valid.

use crate::domain::candle::{closes, Candle};
use crate::domain::indicator::{simple_series, IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::rolling_sample_std;

pub const DEFAULT_PERIOD: usize = 20;

pub fn calculate_stddev(candles: &[Candle], period: usize) -> IndicatorSeries {
    let values = rolling_sample_std(&closes(candles), period);
    simple_series(candles, IndicatorType::Stddev(period), &values)
}

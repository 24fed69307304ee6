//! Average True Range indicator.
//!
//! TR[0] = high - low (no previous close), TR[i] = true range against C[i-1].
//! ATR(n)[i] = simple mean of TR over the trailing n bars.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::candle::Candle;
use crate::domain::indicator::{simple_series, IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::rolling_mean;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_atr(candles: &[Candle], period: usize) -> IndicatorSeries {
    let true_ranges: Vec<f64> = candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            let prev_close = i.checked_sub(1).map(|p| candles[p].close);
            candle.true_range(prev_close)
        })
        .collect();

    let values = rolling_mean(&true_ranges, period);
    simple_series(candles, IndicatorType::Atr(period), &values)
}

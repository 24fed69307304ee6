//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seeded with the first close, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! No warmup: every bar is valid.

use crate::domain::candle::{closes, Candle};
use crate::domain::indicator::{simple_series, IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::ema_values;

pub const DEFAULT_PERIOD: usize = 20;

pub fn calculate_ema(candles: &[Candle], period: usize) -> IndicatorSeries {
    if period == 0 {
        let missing = vec![None; candles.len()];
        return simple_series(candles, IndicatorType::Ema(period), &missing);
    }

    let values: Vec<Option<f64>> = ema_values(&closes(candles), period)
        .into_iter()
        .map(Some)
        .collect();

    simple_series(candles, IndicatorType::Ema(period), &values)
}

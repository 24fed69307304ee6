//! RSI (Relative Strength Index) indicator.
//!
//! Average gain/loss are simple rolling means of the close-to-close changes:
//! - change[0] = 0 (no prior close), change[i] = C[i] - C[i-1]
//! - gain = max(change, 0), loss = max(-change, 0)
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first (n-1) bars are invalid.

use crate::domain::candle::Candle;
use crate::domain::indicator::{simple_series, IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::rolling_mean;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_rsi(candles: &[Candle], period: usize) -> IndicatorSeries {
    let mut gains = Vec::with_capacity(candles.len());
    let mut losses = Vec::with_capacity(candles.len());

    for (i, candle) in candles.iter().enumerate() {
        let change = if i == 0 {
            0.0
        } else {
            candle.close - candles[i - 1].close
        };
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let avg_gains = rolling_mean(&gains, period);
    let avg_losses = rolling_mean(&losses, period);

    let values: Vec<Option<f64>> = avg_gains
        .iter()
        .zip(&avg_losses)
        .map(|(gain, loss)| match (gain, loss) {
            (Some(g), Some(l)) => Some(rsi_from_averages(*g, *l)),
            _ => None,
        })
        .collect();

    simple_series(candles, IndicatorType::Rsi(period), &values)
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

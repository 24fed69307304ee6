//! Local support and resistance detection.
//!
//! For window W, close[i] (W <= i < n - W) is a support level when it equals the
//! minimum of closes[i-W .. i+W) and a resistance level when it equals the
//! maximum. Every qualifying index is reported, so a plateau yields adjacent
//! levels.

use crate::domain::candle::Candle;

pub const DEFAULT_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level {
    pub index: usize,
    pub price: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupportResistance {
    pub support: Vec<Level>,
    pub resistance: Vec<Level>,
}

pub fn identify_support_resistance(candles: &[Candle], window: usize) -> SupportResistance {
    let mut levels = SupportResistance::default();
    if window == 0 {
        return levels;
    }

    for i in window..candles.len().saturating_sub(window) {
        let price = candles[i].close;
        let span = &candles[i - window..i + window];
        let lowest = span.iter().map(|c| c.close).fold(f64::INFINITY, f64::min);
        let highest = span
            .iter()
            .map(|c| c.close)
            .fold(f64::NEG_INFINITY, f64::max);

        if price == lowest {
            levels.support.push(Level { index: i, price });
        }
        if price == highest {
            levels.resistance.push(Level { index: i, price });
        }
    }

    levels
}

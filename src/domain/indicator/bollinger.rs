//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is the sample standard deviation (divides by N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are invalid.

use crate::domain::candle::{closes, Candle};
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::indicator_helpers::{rolling_mean, rolling_sample_std};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULT_X100: u32 = 200;

pub fn calculate_bollinger(
    candles: &[Candle],
    period: usize,
    stddev_mult_x100: u32,
) -> IndicatorSeries {
    let prices = closes(candles);
    let middles = rolling_mean(&prices, period);
    let stddevs = rolling_sample_std(&prices, period);
    let mult = stddev_mult_x100 as f64 / 100.0;

    let values = candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            let bands = match (middles[i], stddevs[i]) {
                (Some(middle), Some(stddev)) => Some((
                    middle + mult * stddev,
                    middle,
                    middle - mult * stddev,
                )),
                _ => None,
            };
            let (upper, middle, lower) = bands.unwrap_or((f64::NAN, f64::NAN, f64::NAN));

            IndicatorPoint {
                timestamp: candle.timestamp,
                valid: bands.is_some(),
                value: IndicatorValue::Bollinger {
                    upper,
                    middle,
                    lower,
                },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        },
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::candles_from_closes;

    fn bands_at(series: &IndicatorSeries, i: usize) -> (f64, f64, f64) {
        match series.values[i].value {
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            } => (upper, middle, lower),
            _ => panic!("Expected Bollinger value"),
        }
    }

    #[test]
    fn bollinger_warmup() {
        let series = calculate_bollinger(&candles_from_closes(&[10.0, 20.0, 30.0, 40.0, 50.0]), 3, 200);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[3].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn bollinger_constant_values() {
        let series = calculate_bollinger(&candles_from_closes(&[100.0; 5]), 3, 200);
        let (upper, middle, lower) = bands_at(&series, 2);
        assert!((middle - 100.0).abs() < f64::EPSILON);
        assert!((upper - 100.0).abs() < f64::EPSILON);
        assert!((lower - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bollinger_basic_calculation() {
        let series = calculate_bollinger(&candles_from_closes(&[10.0, 20.0, 30.0]), 3, 200);
        let (upper, middle, lower) = bands_at(&series, 2);

        // sample stddev of [10, 20, 30] is 10
        assert!((middle - 20.0).abs() < 1e-10);
        assert!((upper - 40.0).abs() < 1e-10);
        assert!((lower - 0.0).abs() < 1e-10);
    }

    #[test]
    fn bollinger_multiplier_variations() {
        let series = calculate_bollinger(&candles_from_closes(&[10.0, 20.0, 30.0]), 3, 150);
        let (upper, _, lower) = bands_at(&series, 2);
        assert!((upper - 35.0).abs() < 1e-10);
        assert!((lower - 5.0).abs() < 1e-10);
    }

    #[test]
    fn bollinger_period_one_never_valid() {
        let series = calculate_bollinger(&candles_from_closes(&[10.0, 20.0]), 1, 200);
        assert_eq!(series.valid_count(), 0);
    }

    #[test]
    fn bollinger_indicator_type() {
        let series = calculate_bollinger(&candles_from_closes(&[10.0]), 20, 200);
        assert_eq!(
            series.indicator_type,
            IndicatorType::Bollinger {
                period: 20,
                stddev_mult_x100: 200
            }
        );
    }

    #[test]
    fn bollinger_symmetry() {
        let series = calculate_bollinger(&candles_from_closes(&[10.0, 12.0, 17.0, 11.0]), 3, 200);
        for i in 2..4 {
            let (upper, middle, lower) = bands_at(&series, i);
            assert!(((upper - middle) - (middle - lower)).abs() < 1e-10);
        }
    }
}

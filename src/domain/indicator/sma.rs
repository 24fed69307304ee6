//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) bars are invalid.

use std::collections::BTreeMap;

use crate::domain::candle::{closes, Candle};
use crate::domain::indicator::{simple_series, IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::rolling_mean;

pub const DEFAULT_PERIODS: [usize; 3] = [20, 50, 200];

pub fn calculate_sma(candles: &[Candle], period: usize) -> IndicatorSeries {
    let values = rolling_mean(&closes(candles), period);
    simple_series(candles, IndicatorType::Sma(period), &values)
}

/// One SMA series per requested period, each computed independently.
pub fn calculate_moving_averages(
    candles: &[Candle],
    periods: &[usize],
) -> BTreeMap<usize, IndicatorSeries> {
    periods
        .iter()
        .map(|&period| (period, calculate_sma(candles, period)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::candles_from_closes;
    use approx::assert_relative_eq;

    #[test]
    fn sma_constant_series() {
        let series = calculate_sma(&candles_from_closes(&[42.5; 10]), 4);
        for i in 0..3 {
            assert!(!series.values[i].valid);
        }
        for i in 3..10 {
            assert_relative_eq!(series.simple_at(i).unwrap(), 42.5);
        }
    }

    #[test]
    fn sma_basic() {
        let series = calculate_sma(&candles_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3);
        assert_relative_eq!(series.simple_at(2).unwrap(), 2.0);
        assert_relative_eq!(series.simple_at(4).unwrap(), 4.0);
    }

    #[test]
    fn moving_averages_keyed_by_period() {
        let candles = candles_from_closes(&[1.0, 2.0, 3.0, 4.0]);
        let mas = calculate_moving_averages(&candles, &[2, 3]);

        assert_eq!(mas.len(), 2);
        assert_eq!(mas[&2].indicator_type, IndicatorType::Sma(2));
        assert_relative_eq!(mas[&2].simple_at(3).unwrap(), 3.5);
        assert_relative_eq!(mas[&3].simple_at(3).unwrap(), 3.0);
        assert!(mas[&3].simple_at(1).is_none());
    }

    #[test]
    fn moving_averages_longer_than_series() {
        let candles = candles_from_closes(&[1.0, 2.0]);
        let mas = calculate_moving_averages(&candles, &[5]);
        assert_eq!(mas[&5].len(), 2);
        assert_eq!(mas[&5].valid_count(), 0);
    }
}

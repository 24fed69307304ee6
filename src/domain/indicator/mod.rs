//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: A time series of indicator values aligned with the candles
//!
//! Every calculation is a pure function of its candle slice. Points lacking
//! enough history are marked invalid rather than reported as errors.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod stochastic;
pub mod support_resistance;
pub mod volume_profile;

pub use atr::calculate_atr;
pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;
pub use sma::{calculate_moving_averages, calculate_sma};
pub use stddev::calculate_stddev;
pub use stochastic::calculate_stochastic;
pub use support_resistance::{identify_support_resistance, Level, SupportResistance};
pub use volume_profile::{calculate_volume_profile, VolumeBin};

use chrono::NaiveDateTime;
use std::fmt;

use crate::domain::candle::Candle;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Stochastic {
        k: f64,
        d: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Stddev(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Stochastic {
        k_period: usize,
        d_period: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The value at `index` if it is a valid `Simple` point.
    pub fn simple_at(&self, index: usize) -> Option<f64> {
        match self.values.get(index) {
            Some(IndicatorPoint {
                valid: true,
                value: IndicatorValue::Simple(v),
                ..
            }) => Some(*v),
            _ => None,
        }
    }

    /// Last point, if it is valid.
    pub fn latest(&self) -> Option<&IndicatorPoint> {
        self.values.last().filter(|p| p.valid)
    }

    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|p| p.valid).count()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Stochastic { k_period, d_period } => {
                write!(f, "STOCHASTIC({},{})", k_period, d_period)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}

impl fmt::Display for IndicatorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorValue::Simple(v) => write!(f, "{:.4}", v),
            IndicatorValue::Macd {
                line,
                signal,
                histogram,
            } => write!(
                f,
                "line={:.4} signal={:.4} hist={:.4}",
                line, signal, histogram
            ),
            IndicatorValue::Stochastic { k, d } => write!(f, "%K={:.2} %D={:.2}", k, d),
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            } => write!(
                f,
                "upper={:.4} middle={:.4} lower={:.4}",
                upper, middle, lower
            ),
        }
    }
}

/// Build a `Simple` series from per-candle optional values.
pub(crate) fn simple_series(
    candles: &[Candle],
    indicator_type: IndicatorType,
    values: &[Option<f64>],
) -> IndicatorSeries {
    let values = candles
        .iter()
        .zip(values)
        .map(|(candle, value)| IndicatorPoint {
            timestamp: candle.timestamp,
            valid: value.is_some(),
            value: IndicatorValue::Simple(value.unwrap_or(f64::NAN)),
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

/// Every indicator at its conventional default parameters.
pub fn compute_default_indicators(candles: &[Candle]) -> Vec<IndicatorSeries> {
    let mut all = vec![
        calculate_rsi(candles, rsi::DEFAULT_PERIOD),
        calculate_macd(
            candles,
            macd::DEFAULT_FAST,
            macd::DEFAULT_SLOW,
            macd::DEFAULT_SIGNAL,
        ),
        calculate_bollinger(
            candles,
            bollinger::DEFAULT_PERIOD,
            bollinger::DEFAULT_MULT_X100,
        ),
        calculate_atr(candles, atr::DEFAULT_PERIOD),
        calculate_ema(candles, ema::DEFAULT_PERIOD),
        calculate_stddev(candles, stddev::DEFAULT_PERIOD),
        calculate_stochastic(
            candles,
            stochastic::DEFAULT_K_PERIOD,
            stochastic::DEFAULT_D_PERIOD,
        ),
    ];
    all.extend(calculate_moving_averages(candles, &sma::DEFAULT_PERIODS).into_values());
    all
}

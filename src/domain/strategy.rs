//! Signals and the pluggable strategy capability.
//!
//! A strategy sees the candle prefix up to and including the current step and
//! returns a `Signal`. Any `Fn(&[Candle]) -> Signal` is a strategy; the
//! built-in policies below cover the CLI.

use std::fmt;

use crate::domain::candle::Candle;
use crate::domain::indicator::{calculate_rsi, calculate_sma};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

pub trait Strategy {
    fn signal(&self, history: &[Candle]) -> Signal;
}

impl<F> Strategy for F
where
    F: Fn(&[Candle]) -> Signal,
{
    fn signal(&self, history: &[Candle]) -> Signal {
        self(history)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuiltinStrategy {
    /// Buy after a down close, sell after anything else.
    Reversal,
    /// Buy when RSI drops below `oversold`, sell above `overbought`.
    RsiBand {
        period: usize,
        oversold: f64,
        overbought: f64,
    },
    /// Buy while SMA(fast) is above SMA(slow), sell while below.
    SmaCross { fast: usize, slow: usize },
}

impl BuiltinStrategy {
    pub const NAMES: [&'static str; 3] = ["reversal", "rsi", "sma_cross"];

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinStrategy::Reversal => "reversal",
            BuiltinStrategy::RsiBand { .. } => "rsi",
            BuiltinStrategy::SmaCross { .. } => "sma_cross",
        }
    }

    /// Candles needed before the strategy can emit anything but `Hold`.
    pub fn warmup(&self) -> usize {
        match self {
            BuiltinStrategy::Reversal => 2,
            BuiltinStrategy::RsiBand { period, .. } => *period,
            BuiltinStrategy::SmaCross { slow, .. } => *slow,
        }
    }
}

impl Strategy for BuiltinStrategy {
    fn signal(&self, history: &[Candle]) -> Signal {
        match self {
            BuiltinStrategy::Reversal => reversal(history),
            BuiltinStrategy::RsiBand {
                period,
                oversold,
                overbought,
            } => {
                // the last `period` changes only need period + 1 candles
                let tail = &history[history.len().saturating_sub(period + 1)..];
                let rsi = calculate_rsi(tail, *period);
                match rsi.simple_at(tail.len().wrapping_sub(1)) {
                    Some(v) if v < *oversold => Signal::Buy,
                    Some(v) if v > *overbought => Signal::Sell,
                    _ => Signal::Hold,
                }
            }
            BuiltinStrategy::SmaCross { fast, slow } => {
                // both averages end at the current candle
                let tail = &history[history.len().saturating_sub(*fast.max(slow))..];
                let last = tail.len().wrapping_sub(1);
                let fast_sma = calculate_sma(tail, *fast).simple_at(last);
                let slow_sma = calculate_sma(tail, *slow).simple_at(last);
                match (fast_sma, slow_sma) {
                    (Some(f), Some(s)) if f > s => Signal::Buy,
                    (Some(f), Some(s)) if f < s => Signal::Sell,
                    _ => Signal::Hold,
                }
            }
        }
    }
}

fn reversal(history: &[Candle]) -> Signal {
    match history {
        [.., prev, current] if current.close < prev.close => Signal::Buy,
        [.., _, _] => Signal::Sell,
        _ => Signal::Hold,
    }
}

//! OHLCV candle representation.

use chrono::NaiveDateTime;

use super::error::TradesimError;

#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    ///
    /// Without a previous close only the bar's own range counts.
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        let hl = self.high - self.low;
        match prev_close {
            Some(prev) => {
                let hc = (self.high - prev).abs();
                let lc = (self.low - prev).abs();
                hl.max(hc).max(lc)
            }
            None => hl,
        }
    }
}

/// Check that timestamps are strictly increasing.
pub fn validate_series(candles: &[Candle]) -> Result<(), TradesimError> {
    for (i, pair) in candles.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(TradesimError::data(format!(
                "candle {} at {} is not after {}",
                i + 1,
                pair[1].timestamp,
                pair[0].timestamp
            )));
        }
    }
    Ok(())
}

pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::cell::RefCell;
use std::collections::HashMap;
use tradesim::domain::candle::Candle;
use tradesim::domain::error::TradesimError;
use tradesim::domain::position::ClosedTradeResult;
use tradesim::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Candle>>,
    pub errors: HashMap<String, String>,
    pub saved_trades: RefCell<Vec<ClosedTradeResult>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            saved_trades: RefCell::new(Vec::new()),
        }
    }

    pub fn with_candles(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.data.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn load_candles(&self, symbol: &str) -> Result<Vec<Candle>, TradesimError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TradesimError::data(reason.clone()));
        }
        self.data
            .get(symbol)
            .cloned()
            .ok_or_else(|| TradesimError::data(format!("no candles for {}", symbol)))
    }

    fn save_candles(&self, _symbol: &str, _candles: &[Candle]) -> Result<(), TradesimError> {
        Ok(())
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradesimError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn save_trades(&self, trades: &[ClosedTradeResult]) -> Result<(), TradesimError> {
        *self.saved_trades.borrow_mut() = trades.to_vec();
        Ok(())
    }

    fn load_trades(&self) -> Result<Vec<ClosedTradeResult>, TradesimError> {
        Ok(self.saved_trades.borrow().clone())
    }
}

pub fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn make_candle(hour: i64, close: f64) -> Candle {
    Candle {
        timestamp: start_time() + Duration::hours(hour),
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000.0,
    }
}

/// Hourly candles with the given closes.
pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_candle(i as i64, close))
        .collect()
}

/// Daily candles, for exercising day-boundary behaviour.
pub fn daily_candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            timestamp: start_time() + Duration::days(i as i64),
            ..make_candle(0, close)
        })
        .collect()
}

pub const REVERSAL_CLOSES: [f64; 10] = [10.0, 11.0, 12.0, 11.0, 10.0, 9.0, 10.0, 11.0, 12.0, 13.0];

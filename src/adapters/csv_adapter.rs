//! CSV file data adapter.
//!
//! Candles live in `{base}/{SYMBOL}_ohlcv.csv`, trade history in
//! `{base}/trades.csv`.

use crate::domain::candle::{self, Candle};
use crate::domain::error::TradesimError;
use crate::domain::position::ClosedTradeResult;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

const CANDLE_SUFFIX: &str = "_ohlcv.csv";
const TRADES_FILE: &str = "trades.csv";
// `%.f` is omitted for whole seconds and keeps sub-second candles distinct
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn candle_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}{}", symbol, CANDLE_SUFFIX))
    }

    fn trades_path(&self) -> PathBuf {
        self.base_path.join(TRADES_FILE)
    }
}

/// Accepts epoch milliseconds, `YYYY-MM-DD HH:MM:SS[.fff]`,
/// `YYYY-MM-DDTHH:MM:SS[.fff]` or a bare `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, TradesimError> {
    let value = value.trim();

    if let Ok(millis) = value.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| TradesimError::data(format!("timestamp out of range: {}", millis)));
    }

    for format in [TIMESTAMP_FORMAT, "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(ts);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| TradesimError::data(format!("invalid timestamp '{}'", value)))
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<T, TradesimError>
where
    T::Err: std::fmt::Display,
{
    record
        .get(index)
        .ok_or_else(|| TradesimError::data(format!("row {}: missing {} column", line, name)))?
        .parse()
        .map_err(|e| TradesimError::data(format!("row {}: invalid {} value: {}", line, name, e)))
}

fn reader(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes())
}

fn csv_error(e: csv::Error) -> TradesimError {
    TradesimError::data(format!("CSV error: {}", e))
}

impl DataPort for CsvAdapter {
    fn load_candles(&self, symbol: &str) -> Result<Vec<Candle>, TradesimError> {
        let path = self.candle_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| {
            TradesimError::data(format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut rdr = reader(&content);
        let mut candles = Vec::new();

        for (i, result) in rdr.records().enumerate() {
            let record = result.map_err(csv_error)?;
            let line = i + 2;

            let timestamp = record
                .get(0)
                .ok_or_else(|| {
                    TradesimError::data(format!("row {}: missing timestamp column", line))
                })
                .and_then(parse_timestamp)?;

            candles.push(Candle {
                timestamp,
                open: parse_field(&record, 1, "open", line)?,
                high: parse_field(&record, 2, "high", line)?,
                low: parse_field(&record, 3, "low", line)?,
                close: parse_field(&record, 4, "close", line)?,
                volume: parse_field(&record, 5, "volume", line)?,
            });
        }

        candles.sort_by_key(|c| c.timestamp);
        candle::validate_series(&candles).map_err(|e| {
            TradesimError::data(format!("{}: duplicate timestamps ({})", path.display(), e))
        })?;

        info!(symbol, candles = candles.len(), "loaded candles");
        Ok(candles)
    }

    fn save_candles(&self, symbol: &str, candles: &[Candle]) -> Result<(), TradesimError> {
        let path = self.candle_path(symbol);
        let mut wtr = csv::Writer::from_path(&path).map_err(csv_error)?;

        wtr.write_record(["timestamp", "open", "high", "low", "close", "volume"])
            .map_err(csv_error)?;
        for c in candles {
            wtr.write_record([
                c.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                c.open.to_string(),
                c.high.to_string(),
                c.low.to_string(),
                c.close.to_string(),
                c.volume.to_string(),
            ])
            .map_err(csv_error)?;
        }
        wtr.flush()?;

        info!(symbol, candles = candles.len(), "saved candles");
        Ok(())
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradesimError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            TradesimError::data(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(CANDLE_SUFFIX) {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn save_trades(&self, trades: &[ClosedTradeResult]) -> Result<(), TradesimError> {
        let mut wtr = csv::Writer::from_path(self.trades_path()).map_err(csv_error)?;

        wtr.write_record(["symbol", "pnl", "pnl_pct", "quantity"])
            .map_err(csv_error)?;
        for t in trades {
            wtr.write_record([
                t.symbol.clone(),
                t.pnl.to_string(),
                t.pnl_pct.to_string(),
                t.quantity.to_string(),
            ])
            .map_err(csv_error)?;
        }
        wtr.flush()?;

        info!(trades = trades.len(), "saved trades");
        Ok(())
    }

    fn load_trades(&self) -> Result<Vec<ClosedTradeResult>, TradesimError> {
        let path = self.trades_path();
        if !path.exists() {
            debug!(path = %path.display(), "no trade history yet");
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)?;
        let mut rdr = reader(&content);
        let mut trades = Vec::new();

        for (i, result) in rdr.records().enumerate() {
            let record = result.map_err(csv_error)?;
            let line = i + 2;
            trades.push(ClosedTradeResult {
                symbol: parse_field(&record, 0, "symbol", line)?,
                pnl: parse_field(&record, 1, "pnl", line)?,
                pnl_pct: parse_field(&record, 2, "pnl_pct", line)?,
                quantity: parse_field(&record, 3, "quantity", line)?,
            });
        }

        Ok(trades)
    }
}

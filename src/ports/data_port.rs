//! Market data and trade history port trait.

use crate::domain::candle::Candle;
use crate::domain::error::TradesimError;
use crate::domain::position::ClosedTradeResult;

pub trait DataPort {
    /// Candles for `symbol` in chronological order with unique timestamps.
    fn load_candles(&self, symbol: &str) -> Result<Vec<Candle>, TradesimError>;

    fn save_candles(&self, symbol: &str, candles: &[Candle]) -> Result<(), TradesimError>;

    fn list_symbols(&self) -> Result<Vec<String>, TradesimError>;

    /// Replace the stored trade history with `trades`.
    fn save_trades(&self, trades: &[ClosedTradeResult]) -> Result<(), TradesimError>;

    /// Stored trade history; empty when nothing has been saved yet.
    fn load_trades(&self) -> Result<Vec<ClosedTradeResult>, TradesimError>;
}

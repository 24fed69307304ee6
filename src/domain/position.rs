//! Position tracking and closed-trade records.

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub entry_price: f64,
    pub quantity: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl Position {
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.quantity
    }

    pub fn should_stop_loss(&self, price: f64) -> bool {
        price <= self.stop_loss
    }

    pub fn should_take_profit(&self, price: f64) -> bool {
        price >= self.take_profit
    }

    /// Realize the position at `exit_price`.
    pub fn close_at(&self, exit_price: f64) -> ClosedTradeResult {
        ClosedTradeResult {
            symbol: self.symbol.clone(),
            pnl: self.unrealized_pnl(exit_price),
            pnl_pct: (exit_price - self.entry_price) / self.entry_price * 100.0,
            quantity: self.quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTradeResult {
    pub symbol: String,
    pub pnl: f64,
    pub pnl_pct: f64,
    pub quantity: f64,
}

impl ClosedTradeResult {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }
}

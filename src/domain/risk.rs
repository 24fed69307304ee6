//! Risk manager: position sizing, entry gating, exit triggers and the
//! realized-loss accumulator.
//!
//! The manager owns a symbol -> `Position` table with at most one open
//! position per symbol. It only answers stop-loss/take-profit queries; the
//! caller decides when to `close_position`.
//!
//! The loss accumulator is cumulative since construction unless
//! `reset_loss_daily` is set, in which case `roll_day` clears it whenever the
//! trading day changes.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

use super::error::TradesimError;
use super::position::{ClosedTradeResult, Position};

pub const DEFAULT_RISK_PER_TRADE: f64 = 0.02;
pub const DEFAULT_STOP_LOSS_PCT: f64 = 0.02;

/// What `open_position` does when the symbol already has an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReopenPolicy {
    #[default]
    Replace,
    Reject,
}

impl FromStr for ReopenPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "replace" => Ok(ReopenPolicy::Replace),
            "reject" => Ok(ReopenPolicy::Reject),
            other => Err(format!("expected 'replace' or 'reject', got '{}'", other)),
        }
    }
}

impl fmt::Display for ReopenPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReopenPolicy::Replace => write!(f, "replace"),
            ReopenPolicy::Reject => write!(f, "reject"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    /// Fraction of balance that realized losses may reach before entries stop.
    pub max_daily_loss: f64,
    /// Largest position notional as a fraction of balance.
    pub max_position_size: f64,
    pub max_leverage: f64,
    /// Take-profit distance above entry, as a fraction of entry price.
    pub take_profit_pct: f64,
    pub reopen_policy: ReopenPolicy,
    pub reset_loss_daily: bool,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskConfig {
            max_daily_loss: 0.05,
            max_position_size: 0.1,
            max_leverage: 1.0,
            take_profit_pct: 0.05,
            reopen_policy: ReopenPolicy::Replace,
            reset_loss_daily: false,
        }
    }
}

impl RiskConfig {
    /// Rejects limits that would let the manager size zero or negative
    /// positions. NaN fails every check.
    pub fn validate(&self) -> Result<(), TradesimError> {
        for (name, value) in [
            ("max_daily_loss", self.max_daily_loss),
            ("max_position_size", self.max_position_size),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(TradesimError::invalid_argument(
                    name,
                    format!("must be in (0, 1], got {}", value),
                ));
            }
        }
        for (name, value) in [
            ("max_leverage", self.max_leverage),
            ("take_profit_pct", self.take_profit_pct),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(TradesimError::invalid_argument(
                    name,
                    format!("must be a positive number, got {}", value),
                ));
            }
        }
        Ok(())
    }
}

/// Result of `open_position`.
#[derive(Debug, Clone, PartialEq)]
pub enum OpenOutcome {
    Opened,
    /// The previous position was discarded.
    Replaced(Position),
    /// A position was already open and the policy forbids replacing it.
    Rejected,
}

#[derive(Debug, Clone)]
pub struct RiskManager {
    config: RiskConfig,
    realized_loss: f64,
    positions: HashMap<String, Position>,
    loss_day: Option<NaiveDate>,
}

impl Default for RiskManager {
    fn default() -> Self {
        Self::new(RiskConfig::default())
    }
}

impl RiskManager {
    pub fn new(config: RiskConfig) -> Self {
        info!(
            max_daily_loss = config.max_daily_loss,
            max_position_size = config.max_position_size,
            max_leverage = config.max_leverage,
            "risk manager initialized"
        );
        RiskManager {
            config,
            realized_loss: 0.0,
            positions: HashMap::new(),
            loss_day: None,
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn realized_loss(&self) -> f64 {
        self.realized_loss
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn positions(&self) -> &HashMap<String, Position> {
        &self.positions
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    /// Notional to commit: (balance * risk_per_trade) / stop_loss_pct, capped
    /// at balance * max_position_size.
    pub fn compute_position_size(
        &self,
        balance: f64,
        risk_per_trade: f64,
        stop_loss_pct: f64,
    ) -> Result<f64, TradesimError> {
        if !(stop_loss_pct > 0.0 && stop_loss_pct.is_finite()) {
            return Err(TradesimError::invalid_argument(
                "stop_loss_pct",
                format!("must be a positive number, got {}", stop_loss_pct),
            ));
        }

        let risk_amount = balance * risk_per_trade;
        let size = (risk_amount / stop_loss_pct).min(self.max_position(balance));
        debug!(balance, risk_per_trade, stop_loss_pct, size, "calculated position size");
        Ok(size)
    }

    /// Whether a new position of `proposed_size` notional is allowed.
    pub fn can_open(&self, symbol: &str, proposed_size: f64, balance: f64) -> bool {
        if self.realized_loss >= balance * self.config.max_daily_loss {
            warn!(
                symbol,
                realized_loss = self.realized_loss,
                "daily loss limit reached"
            );
            return false;
        }

        if proposed_size > self.max_position(balance) {
            warn!(symbol, proposed_size, "position size exceeds limit");
            return false;
        }

        true
    }

    pub fn open_position(
        &mut self,
        symbol: &str,
        entry_price: f64,
        quantity: f64,
        stop_loss: f64,
    ) -> OpenOutcome {
        if self.has_position(symbol) && self.config.reopen_policy == ReopenPolicy::Reject {
            warn!(symbol, "position already open, rejecting");
            return OpenOutcome::Rejected;
        }

        let position = Position {
            symbol: symbol.to_string(),
            entry_price,
            quantity,
            stop_loss,
            take_profit: entry_price * (1.0 + self.config.take_profit_pct),
        };
        info!(symbol, quantity, entry_price, "position opened");

        match self.positions.insert(symbol.to_string(), position) {
            Some(previous) => {
                warn!(symbol, "replaced existing position");
                OpenOutcome::Replaced(previous)
            }
            None => OpenOutcome::Opened,
        }
    }

    pub fn is_stop_loss_hit(&self, symbol: &str, current_price: f64) -> bool {
        let hit = self
            .position(symbol)
            .is_some_and(|p| p.should_stop_loss(current_price));
        if hit {
            warn!(symbol, current_price, "stop loss triggered");
        }
        hit
    }

    pub fn is_take_profit_hit(&self, symbol: &str, current_price: f64) -> bool {
        let hit = self
            .position(symbol)
            .is_some_and(|p| p.should_take_profit(current_price));
        if hit {
            info!(symbol, current_price, "take profit reached");
        }
        hit
    }

    /// Close the position for `symbol`. `None` when nothing is open.
    pub fn close_position(&mut self, symbol: &str, exit_price: f64) -> Option<ClosedTradeResult> {
        let position = self.positions.remove(symbol)?;
        let result = position.close_at(exit_price);

        if result.pnl < 0.0 {
            self.realized_loss += result.pnl.abs();
        }
        info!(symbol, pnl = result.pnl, pnl_pct = result.pnl_pct, "position closed");

        Some(result)
    }

    pub fn reset_daily_loss(&mut self) {
        debug!(realized_loss = self.realized_loss, "resetting realized loss");
        self.realized_loss = 0.0;
    }

    /// Advance the loss accounting to `day`. Clears the accumulator on a day
    /// change when daily reset is enabled; otherwise a no-op.
    pub fn roll_day(&mut self, day: NaiveDate) {
        if !self.config.reset_loss_daily {
            return;
        }
        match self.loss_day {
            Some(current) if current == day => {}
            Some(_) => {
                self.reset_daily_loss();
                self.loss_day = Some(day);
            }
            None => self.loss_day = Some(day),
        }
    }

    fn max_position(&self, balance: f64) -> f64 {
        balance * self.config.max_position_size
    }
}

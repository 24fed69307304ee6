//! Backtest engine and event loop.
//!
//! Replays a candle series through a [`Strategy`], holding at most one
//! position at a time. Each step the strategy sees `candles[..=i]`, so it can
//! never look ahead. Fills happen at the step's close.
//!
//! In [`SizingMode::FullBalance`] the engine commits the whole balance to each
//! entry and exits only on a Sell signal. [`SizingMode::RiskManaged`] routes
//! sizing, entry gating and stop-loss/take-profit exits through an owned
//! [`RiskManager`].

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use super::candle::Candle;
use super::error::TradesimError;
use super::metrics::TradeStats;
use super::position::ClosedTradeResult;
use super::risk::{OpenOutcome, RiskConfig, RiskManager};
use super::strategy::{Signal, Strategy};

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SizingMode {
    /// Commit the entire balance on every entry.
    #[default]
    FullBalance,
    RiskManaged {
        risk_per_trade: f64,
        stop_loss_pct: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub symbol: String,
    pub sizing: SizingMode,
    /// Only consulted in risk-managed mode.
    pub risk: RiskConfig,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            symbol: "BACKTEST".to_string(),
            sizing: SizingMode::FullBalance,
            risk: RiskConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Signal,
    StopLoss,
    TakeProfit,
}

/// A completed round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_index: usize,
    pub exit_index: usize,
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    pub pnl: f64,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn bars_held(&self) -> usize {
        self.exit_index - self.entry_index
    }

    pub fn pnl_pct(&self) -> f64 {
        (self.exit_price - self.entry_price) / self.entry_price * 100.0
    }
}

/// The position still held when the candles run out. It is reported as-is,
/// never liquidated.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenTrade {
    pub entry_index: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub quantity: f64,
}

impl OpenTrade {
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.quantity
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    pub final_balance: f64,
    pub total_return_pct: f64,
    pub trade_count: usize,
    pub win_rate: f64,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub report: BacktestReport,
    pub trades: Vec<Trade>,
    pub stats: TradeStats,
    pub equity_curve: Vec<EquityPoint>,
    pub open_position: Option<OpenTrade>,
}

impl BacktestResult {
    /// Convert the trade log into records for the trade store.
    pub fn closed_trade_results(&self, symbol: &str) -> Vec<ClosedTradeResult> {
        self.trades
            .iter()
            .map(|t| ClosedTradeResult {
                symbol: symbol.to_string(),
                pnl: t.pnl,
                pnl_pct: t.pnl_pct(),
                quantity: t.quantity,
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Result<Self, TradesimError> {
        if !(config.initial_capital > 0.0 && config.initial_capital.is_finite()) {
            return Err(TradesimError::invalid_argument(
                "initial_capital",
                format!("must be a positive number, got {}", config.initial_capital),
            ));
        }
        if let SizingMode::RiskManaged {
            risk_per_trade,
            stop_loss_pct,
        } = config.sizing
        {
            if !(risk_per_trade > 0.0 && risk_per_trade.is_finite()) {
                return Err(TradesimError::invalid_argument(
                    "risk_per_trade",
                    format!("must be a positive number, got {}", risk_per_trade),
                ));
            }
            if !(stop_loss_pct > 0.0 && stop_loss_pct < 1.0) {
                return Err(TradesimError::invalid_argument(
                    "stop_loss_pct",
                    format!("must be in (0, 1), got {}", stop_loss_pct),
                ));
            }
        }
        config.risk.validate()?;
        Ok(BacktestEngine { config })
    }

    /// Full-balance engine with the given starting capital.
    pub fn with_capital(initial_capital: f64) -> Result<Self, TradesimError> {
        Self::new(BacktestConfig {
            initial_capital,
            ..BacktestConfig::default()
        })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn run<S>(&self, candles: &[Candle], strategy: &S) -> BacktestResult
    where
        S: Strategy + ?Sized,
    {
        let symbol = self.config.symbol.as_str();
        let mut state = RunState {
            balance: self.config.initial_capital,
            holding: None,
            trades: Vec::new(),
            risk: match self.config.sizing {
                SizingMode::FullBalance => None,
                SizingMode::RiskManaged { .. } => {
                    Some(RiskManager::new(self.config.risk.clone()))
                }
            },
        };
        let mut equity_curve = Vec::with_capacity(candles.len());

        for (i, candle) in candles.iter().enumerate() {
            if let Some(reason) = state.check_exit_triggers(symbol, candle) {
                state.exit(symbol, i, candle, reason);
            }

            match strategy.signal(&candles[..=i]) {
                Signal::Buy if state.holding.is_none() => {
                    state.enter(symbol, i, candle, self.config.sizing)
                }
                Signal::Sell if state.holding.is_some() => {
                    state.exit(symbol, i, candle, ExitReason::Signal)
                }
                _ => {}
            }

            let unrealized = state
                .holding
                .as_ref()
                .map_or(0.0, |h| h.unrealized_pnl(candle.close));
            equity_curve.push(EquityPoint {
                timestamp: candle.timestamp,
                equity: state.balance + unrealized,
            });
        }

        let report = build_report(self.config.initial_capital, state.balance, &state.trades);
        let stats = TradeStats::compute(&state.trades, &equity_curve);

        info!(
            symbol,
            candles = candles.len(),
            trades = report.trade_count,
            final_balance = report.final_balance,
            total_return_pct = report.total_return_pct,
            "backtest completed"
        );

        BacktestResult {
            report,
            trades: state.trades,
            stats,
            equity_curve,
            open_position: state.holding,
        }
    }
}

struct RunState {
    balance: f64,
    holding: Option<OpenTrade>,
    trades: Vec<Trade>,
    risk: Option<RiskManager>,
}

impl RunState {
    fn check_exit_triggers(&mut self, symbol: &str, candle: &Candle) -> Option<ExitReason> {
        let rm = self.risk.as_mut()?;
        rm.roll_day(candle.timestamp.date());
        self.holding.as_ref()?;

        if rm.is_stop_loss_hit(symbol, candle.close) {
            Some(ExitReason::StopLoss)
        } else if rm.is_take_profit_hit(symbol, candle.close) {
            Some(ExitReason::TakeProfit)
        } else {
            None
        }
    }

    fn enter(&mut self, symbol: &str, index: usize, candle: &Candle, sizing: SizingMode) {
        let price = candle.close;
        if !(price > 0.0 && price.is_finite()) {
            warn!(symbol, index, price, "skipping entry at non-positive price");
            return;
        }

        let quantity = match (sizing, self.risk.as_mut()) {
            (
                SizingMode::RiskManaged {
                    risk_per_trade,
                    stop_loss_pct,
                },
                Some(rm),
            ) => {
                let notional =
                    match rm.compute_position_size(self.balance, risk_per_trade, stop_loss_pct) {
                        Ok(n) => n,
                        Err(e) => {
                            warn!(symbol, index, error = %e, "position sizing failed");
                            return;
                        }
                    };
                if !rm.can_open(symbol, notional, self.balance) {
                    return;
                }
                let quantity = notional / price;
                let stop_loss = price * (1.0 - stop_loss_pct);
                if rm.open_position(symbol, price, quantity, stop_loss) == OpenOutcome::Rejected {
                    return;
                }
                quantity
            }
            _ => self.balance / price,
        };

        debug!(symbol, index, price, quantity, "entered position");
        self.holding = Some(OpenTrade {
            entry_index: index,
            entry_time: candle.timestamp,
            entry_price: price,
            quantity,
        });
    }

    fn exit(&mut self, symbol: &str, index: usize, candle: &Candle, reason: ExitReason) {
        let Some(open) = self.holding.take() else {
            return;
        };
        let price = candle.close;

        let pnl = match self.risk.as_mut() {
            Some(rm) => rm
                .close_position(symbol, price)
                .map_or_else(|| open.unrealized_pnl(price), |closed| closed.pnl),
            None => open.unrealized_pnl(price),
        };
        self.balance += pnl;

        debug!(symbol, index, price, pnl, ?reason, "exited position");
        self.trades.push(Trade {
            entry_index: open.entry_index,
            exit_index: index,
            entry_time: open.entry_time,
            exit_time: candle.timestamp,
            entry_price: open.entry_price,
            exit_price: price,
            quantity: open.quantity,
            pnl,
            exit_reason: reason,
        });
    }
}

fn build_report(initial_capital: f64, final_balance: f64, trades: &[Trade]) -> BacktestReport {
    let trade_count = trades.len();
    let wins = trades.iter().filter(|t| t.pnl > 0.0).count();
    let win_rate = if trade_count > 0 {
        wins as f64 / trade_count as f64
    } else {
        0.0
    };

    BacktestReport {
        final_balance,
        total_return_pct: (final_balance - initial_capital) / initial_capital * 100.0,
        trade_count,
        win_rate,
    }
}

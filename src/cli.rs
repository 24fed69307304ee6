//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{
    BacktestConfig, BacktestEngine, BacktestResult, SizingMode, DEFAULT_INITIAL_CAPITAL,
};
use crate::domain::config_validation::{known_strategies, validate_all, validate_risk_config};
use crate::domain::error::TradesimError;
use crate::domain::indicator::{
    compute_default_indicators, identify_support_resistance, support_resistance,
    volume_profile::{self, point_of_control},
};
use crate::domain::risk::{
    ReopenPolicy, RiskConfig, RiskManager, DEFAULT_RISK_PER_TRADE, DEFAULT_STOP_LOSS_PCT,
};
use crate::domain::strategy::BuiltinStrategy;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_SYMBOL: &str = "BTCUSDT";

#[derive(Parser, Debug)]
#[command(name = "tradesim", about = "Indicator, risk and backtest toolkit")]
pub struct Cli {
    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Write closed trades to {data_dir}/trades.csv
        #[arg(long)]
        save_trades: bool,
    },
    /// Print the latest value of every indicator for a symbol
    Indicators {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show position sizing for a balance
    Risk {
        #[arg(long)]
        balance: f64,
        #[arg(long, default_value_t = DEFAULT_RISK_PER_TRADE)]
        risk_per_trade: f64,
        #[arg(long, default_value_t = DEFAULT_STOP_LOSS_PCT)]
        stop_loss_pct: f64,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    // a subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing(cli.verbose);

    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Dispatch a subcommand without touching process state.
pub fn execute(command: Command) -> Result<(), TradesimError> {
    match command {
        Command::Backtest {
            config,
            symbol,
            data_dir,
            save_trades,
        } => run_backtest(&config, symbol.as_deref(), data_dir.as_deref(), save_trades),
        Command::Indicators {
            symbol,
            data_dir,
            config,
        } => run_indicators(&symbol, data_dir.as_deref(), config.as_deref()),
        Command::Risk {
            balance,
            risk_per_trade,
            stop_loss_pct,
            config,
        } => run_risk(balance, risk_per_trade, stop_loss_pct, config.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TradesimError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

fn run_backtest(
    config_path: &Path,
    symbol_override: Option<&str>,
    data_dir_override: Option<&Path>,
    save_trades: bool,
) -> Result<(), TradesimError> {
    let adapter = load_config(config_path)?;
    validate_all(&adapter)?;

    let strategy = build_strategy(&adapter)?;
    let bt_config = build_backtest_config(&adapter, symbol_override)?;
    let data_port = CsvAdapter::new(resolve_data_dir(&adapter, data_dir_override));

    let result = run_backtest_pipeline(&data_port, &strategy, bt_config.clone(), save_trades)?;
    print_report(&bt_config, &strategy, &result);
    Ok(())
}

/// Load candles, run the engine and optionally persist the trade log.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    strategy: &BuiltinStrategy,
    bt_config: BacktestConfig,
    save_trades: bool,
) -> Result<BacktestResult, TradesimError> {
    let symbol = bt_config.symbol.clone();
    let candles = data_port.load_candles(&symbol)?;

    let minimum = strategy.warmup().max(1);
    if candles.len() < minimum {
        return Err(TradesimError::InsufficientData {
            symbol,
            bars: candles.len(),
            minimum,
        });
    }

    info!(
        symbol = %symbol,
        strategy = strategy.name(),
        candles = candles.len(),
        "running backtest"
    );
    let engine = BacktestEngine::new(bt_config)?;
    let result = engine.run(&candles, strategy);

    if save_trades {
        data_port.save_trades(&result.closed_trade_results(&symbol))?;
    }
    Ok(result)
}

fn print_report(config: &BacktestConfig, strategy: &BuiltinStrategy, result: &BacktestResult) {
    let report = &result.report;
    let stats = &result.stats;

    println!("=== Backtest: {} ({}) ===", config.symbol, strategy.name());
    println!("Initial Capital:  {:.2}", config.initial_capital);
    println!("Final Balance:    {:.2}", report.final_balance);
    println!("Total Return:     {:.2}%", report.total_return_pct);
    println!("Total Trades:     {}", report.trade_count);
    println!("Win Rate:         {:.1}%", report.win_rate * 100.0);
    println!("Profit Factor:    {:.2}", stats.profit_factor);
    println!("Max Drawdown:     -{:.1}%", stats.max_drawdown * 100.0);
    println!("Avg Bars Held:    {:.1}", stats.avg_bars_held);

    if let Some(open) = &result.open_position {
        println!(
            "Open Position:    {:.6} @ {:.2} since {}",
            open.quantity, open.entry_price, open.entry_time
        );
    }
}

fn run_indicators(
    symbol: &str,
    data_dir_override: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<(), TradesimError> {
    let data_dir = match config_path {
        Some(path) => resolve_data_dir(&load_config(path)?, data_dir_override),
        None => data_dir_override
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
    };
    let candles = CsvAdapter::new(data_dir).load_candles(symbol)?;

    println!("=== Indicators: {} ({} candles) ===", symbol, candles.len());
    for series in compute_default_indicators(&candles) {
        let label = series.indicator_type.to_string();
        match series.latest() {
            Some(point) => println!("{:<18} {}", label, point.value),
            None => println!("{:<18} n/a", label),
        }
    }

    let profile = volume_profile::calculate_volume_profile(&candles, volume_profile::DEFAULT_BINS);
    if let Some(poc) = point_of_control(&profile) {
        println!(
            "{:<18} {:.4} ({:.2} volume)",
            "POC",
            poc.midpoint(),
            poc.volume
        );
    }

    let levels = identify_support_resistance(&candles, support_resistance::DEFAULT_WINDOW);
    if let Some(level) = levels.support.last() {
        println!("{:<18} {:.4} (candle {})", "Support", level.price, level.index);
    }
    if let Some(level) = levels.resistance.last() {
        println!(
            "{:<18} {:.4} (candle {})",
            "Resistance", level.price, level.index
        );
    }
    Ok(())
}

fn run_risk(
    balance: f64,
    risk_per_trade: f64,
    stop_loss_pct: f64,
    config_path: Option<&Path>,
) -> Result<(), TradesimError> {
    let risk_config = match config_path {
        Some(path) => {
            let adapter = load_config(path)?;
            validate_risk_config(&adapter)?;
            build_risk_config(&adapter)?
        }
        None => RiskConfig::default(),
    };
    let manager = RiskManager::new(risk_config);

    let size = manager.compute_position_size(balance, risk_per_trade, stop_loss_pct)?;
    let allowed = manager.can_open("-", size, balance);
    let config = manager.config();

    println!("Balance:           {:.2}", balance);
    println!("Risk Per Trade:    {:.2}%", risk_per_trade * 100.0);
    println!("Stop Loss:         {:.2}%", stop_loss_pct * 100.0);
    println!(
        "Position Cap:      {:.2} ({:.1}%)",
        balance * config.max_position_size,
        config.max_position_size * 100.0
    );
    println!("Position Size:     {:.2}", size);
    println!("Entry Allowed:     {}", if allowed { "yes" } else { "no" });
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), TradesimError> {
    let adapter = load_config(config_path)?;
    validate_all(&adapter)?;
    let strategy = build_strategy(&adapter)?;
    println!(
        "Configuration OK: {} (strategy {})",
        config_path.display(),
        strategy.name()
    );
    Ok(())
}

pub fn resolve_data_dir(adapter: &dyn ConfigPort, data_dir_override: Option<&Path>) -> PathBuf {
    match data_dir_override {
        Some(dir) => dir.to_path_buf(),
        None => adapter
            .get_string("backtest", "data_dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
    }
}

pub fn build_backtest_config(
    adapter: &dyn ConfigPort,
    symbol_override: Option<&str>,
) -> Result<BacktestConfig, TradesimError> {
    let symbol = symbol_override
        .map(str::to_string)
        .or_else(|| adapter.get_string("backtest", "symbol"))
        .unwrap_or_else(|| DEFAULT_SYMBOL.to_string());

    let sizing_name = adapter
        .get_string("backtest", "sizing")
        .unwrap_or_else(|| "full_balance".to_string());
    let sizing = match sizing_name.trim().to_lowercase().as_str() {
        "full_balance" => SizingMode::FullBalance,
        "risk_managed" => SizingMode::RiskManaged {
            risk_per_trade: adapter.get_double("backtest", "risk_per_trade", DEFAULT_RISK_PER_TRADE),
            stop_loss_pct: adapter.get_double("backtest", "stop_loss_pct", DEFAULT_STOP_LOSS_PCT),
        },
        other => {
            return Err(TradesimError::ConfigInvalid {
                section: "backtest".into(),
                key: "sizing".into(),
                reason: format!("unknown sizing mode '{}'", other),
            });
        }
    };

    let config = BacktestConfig {
        initial_capital: adapter.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL),
        symbol,
        sizing,
        risk: build_risk_config(adapter)?,
    };
    debug!(?config, "built backtest config");
    Ok(config)
}

pub fn build_risk_config(adapter: &dyn ConfigPort) -> Result<RiskConfig, TradesimError> {
    let defaults = RiskConfig::default();

    let reopen_policy = match adapter.get_string("risk", "reopen_policy") {
        Some(s) => s
            .parse::<ReopenPolicy>()
            .map_err(|reason| TradesimError::ConfigInvalid {
                section: "risk".into(),
                key: "reopen_policy".into(),
                reason,
            })?,
        None => defaults.reopen_policy,
    };

    Ok(RiskConfig {
        max_daily_loss: adapter.get_double("risk", "max_daily_loss", defaults.max_daily_loss),
        max_position_size: adapter.get_double("risk", "max_position_size", defaults.max_position_size),
        max_leverage: adapter.get_double("risk", "max_leverage", defaults.max_leverage),
        take_profit_pct: adapter.get_double("risk", "take_profit_pct", defaults.take_profit_pct),
        reopen_policy,
        reset_loss_daily: adapter.get_bool("risk", "reset_loss_daily", defaults.reset_loss_daily),
    })
}

pub fn build_strategy(adapter: &dyn ConfigPort) -> Result<BuiltinStrategy, TradesimError> {
    let name = adapter
        .get_string("strategy", "name")
        .unwrap_or_else(|| "reversal".to_string());

    let strategy = match name.trim().to_lowercase().as_str() {
        "reversal" => BuiltinStrategy::Reversal,
        "rsi" => BuiltinStrategy::RsiBand {
            period: get_period(adapter, "rsi_period", 14)?,
            oversold: adapter.get_double("strategy", "oversold", 30.0),
            overbought: adapter.get_double("strategy", "overbought", 70.0),
        },
        "sma_cross" => BuiltinStrategy::SmaCross {
            fast: get_period(adapter, "fast_period", 20)?,
            slow: get_period(adapter, "slow_period", 50)?,
        },
        _ => {
            debug!(known = %known_strategies(), "unrecognised strategy");
            return Err(TradesimError::UnknownStrategy { name });
        }
    };
    Ok(strategy)
}

fn get_period(adapter: &dyn ConfigPort, key: &str, default: i64) -> Result<usize, TradesimError> {
    let value = adapter.get_int("strategy", key, default);
    usize::try_from(value)
        .ok()
        .filter(|&p| p > 0)
        .ok_or_else(|| TradesimError::ConfigInvalid {
            section: "strategy".into(),
            key: key.into(),
            reason: format!("{} must be at least 1, got {}", key, value),
        })
}

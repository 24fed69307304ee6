//! CLI integration tests.
//!
//! Tests cover:
//! - Config building from INI files on disk
//! - Each subcommand end to end against a temporary data directory
//! - Exit codes for the error families

mod common;

use clap::Parser;
use common::*;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use tradesim::adapters::csv_adapter::CsvAdapter;
use tradesim::adapters::file_config_adapter::FileConfigAdapter;
use tradesim::cli::{self, Cli};
use tradesim::domain::backtest::SizingMode;
use tradesim::domain::risk::ReopenPolicy;
use tradesim::domain::strategy::BuiltinStrategy;
use tradesim::ports::data_port::DataPort;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[backtest]
initial_capital = 1000.0
symbol = BTCUSDT
sizing = full_balance

[risk]
max_daily_loss = 0.05
max_position_size = 0.1
max_leverage = 1.0
take_profit_pct = 0.05
reopen_policy = replace
reset_loss_daily = false

[strategy]
name = reversal
"#;

fn seed_data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let adapter = CsvAdapter::new(dir.path().to_path_buf());
    adapter
        .save_candles("BTCUSDT", &candles_from_closes(&REVERSAL_CLOSES))
        .unwrap();
    dir
}

/// Exit status the binary would report for `args`.
fn run_cli(args: &[&str]) -> u8 {
    let mut argv = vec!["tradesim"];
    argv.extend_from_slice(args);
    let parsed = Cli::try_parse_from(argv).unwrap();
    match cli::execute(parsed.command) {
        Ok(()) => 0,
        Err(e) => e.exit_code(),
    }
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

mod config_loading {
    use super::*;

    #[test]
    fn build_configs_from_file() {
        let file = write_temp_ini(VALID_INI);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();

        let bt = cli::build_backtest_config(&adapter, None).unwrap();
        assert_eq!(bt.initial_capital, 1000.0);
        assert_eq!(bt.symbol, "BTCUSDT");
        assert_eq!(bt.sizing, SizingMode::FullBalance);
        assert_eq!(bt.risk.reopen_policy, ReopenPolicy::Replace);

        assert_eq!(
            cli::build_strategy(&adapter).unwrap(),
            BuiltinStrategy::Reversal
        );
    }

    #[test]
    fn risk_config_from_file() {
        let file = write_temp_ini(
            "[risk]\nmax_daily_loss = 0.1\nmax_position_size = 0.3\nreopen_policy = Reject\n",
        );
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        let risk = cli::build_risk_config(&adapter).unwrap();

        assert_eq!(risk.max_daily_loss, 0.1);
        assert_eq!(risk.max_position_size, 0.3);
        assert_eq!(risk.max_leverage, 1.0);
        assert_eq!(risk.take_profit_pct, 0.05);
        assert_eq!(risk.reopen_policy, ReopenPolicy::Reject);
        assert!(!risk.reset_loss_daily);
    }
}

mod commands {
    use super::*;

    #[test]
    fn validate_accepts_valid_file() {
        let file = write_temp_ini(VALID_INI);
        assert_eq!(
            run_cli(&["validate", "--config", path_str(file.path())]),
            0
        );
    }

    #[test]
    fn validate_unknown_strategy_exit_code() {
        let file = write_temp_ini("[strategy]\nname = lstm\n");
        assert_eq!(
            run_cli(&["validate", "--config", path_str(file.path())]),
            4
        );
    }

    #[test]
    fn validate_bad_value_exit_code() {
        let file = write_temp_ini("[risk]\nmax_position_size = 2.0\n");
        assert_eq!(
            run_cli(&["validate", "--config", path_str(file.path())]),
            2
        );
    }

    #[test]
    fn missing_config_file_exit_code() {
        assert_eq!(
            run_cli(&["validate", "--config", "/nonexistent/tradesim.ini"]),
            1
        );
    }

    #[test]
    fn backtest_saves_trades() {
        let data = seed_data_dir();
        let file = write_temp_ini(VALID_INI);

        let code = run_cli(&[
            "backtest",
            "--config",
            path_str(file.path()),
            "--data-dir",
            path_str(data.path()),
            "--save-trades",
        ]);
        assert_eq!(code, 0);

        let trades = CsvAdapter::new(data.path().to_path_buf())
            .load_trades()
            .unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].symbol, "BTCUSDT");
        assert!(trades[0].pnl < 0.0);
    }

    #[test]
    fn backtest_without_save_leaves_no_trades_file() {
        let data = seed_data_dir();
        let file = write_temp_ini(VALID_INI);

        let code = run_cli(&[
            "backtest",
            "--config",
            path_str(file.path()),
            "--data-dir",
            path_str(data.path()),
        ]);
        assert_eq!(code, 0);
        assert!(!data.path().join("trades.csv").exists());
    }

    #[test]
    fn backtest_missing_symbol_data_exit_code() {
        let data = seed_data_dir();
        let file = write_temp_ini(VALID_INI);

        let code = run_cli(&[
            "backtest",
            "--config",
            path_str(file.path()),
            "--data-dir",
            path_str(data.path()),
            "--symbol",
            "DOGEUSDT",
        ]);
        assert_eq!(code, 3);
    }

    #[test]
    fn backtest_insufficient_data_exit_code() {
        let data = seed_data_dir();
        let file = write_temp_ini(
            "[backtest]\nsymbol = BTCUSDT\n[strategy]\nname = sma_cross\nfast_period = 5\nslow_period = 30\n",
        );

        let code = run_cli(&[
            "backtest",
            "--config",
            path_str(file.path()),
            "--data-dir",
            path_str(data.path()),
        ]);
        assert_eq!(code, 5);
    }

    #[test]
    fn backtest_reads_data_dir_from_config() {
        let data = seed_data_dir();
        let ini = format!(
            "[backtest]\nsymbol = BTCUSDT\ndata_dir = {}\nsizing = risk_managed\n",
            data.path().display()
        );
        let file = write_temp_ini(&ini);

        assert_eq!(
            run_cli(&["backtest", "--config", path_str(file.path())]),
            0
        );
    }

    #[test]
    fn indicators_command_runs() {
        let data = seed_data_dir();
        assert_eq!(
            run_cli(&[
                "indicators",
                "--symbol",
                "BTCUSDT",
                "--data-dir",
                path_str(data.path()),
            ]),
            0
        );
    }

    #[test]
    fn risk_command_runs() {
        assert_eq!(
            run_cli(&["risk", "--balance", "10000"]),
            0
        );
    }

    #[test]
    fn risk_command_rejects_zero_stop() {
        assert_eq!(
            run_cli(&["risk", "--balance", "10000", "--stop-loss-pct", "0"]),
            6
        );
    }

    #[test]
    fn risk_command_validates_config_limits() {
        let file = write_temp_ini("[risk]\nmax_position_size = 0\n");
        assert_eq!(
            run_cli(&[
                "risk",
                "--balance",
                "10000",
                "--config",
                path_str(file.path()),
            ]),
            2
        );
    }

    #[test]
    fn duplicate_candles_exit_code() {
        let data = TempDir::new().unwrap();
        fs::write(
            data.path().join("BTCUSDT_ohlcv.csv"),
            "timestamp,open,high,low,close,volume\n\
             1704067200000,1,1,1,1,1\n\
             2024-01-01 00:00:00,1,1,1,1,1\n",
        )
        .unwrap();
        let file = write_temp_ini(VALID_INI);

        let code = run_cli(&[
            "backtest",
            "--config",
            path_str(file.path()),
            "--data-dir",
            path_str(data.path()),
        ]);
        assert_eq!(code, 3);
    }
}

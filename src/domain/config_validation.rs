//! Configuration validation.
//!
//! Validates every config field before a run so a bad file fails fast with the
//! offending section and key.

use crate::domain::error::TradesimError;
use crate::domain::risk::ReopenPolicy;
use crate::domain::strategy::BuiltinStrategy;
use crate::ports::config_port::ConfigPort;

pub fn validate_all(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    validate_backtest_config(config)?;
    validate_risk_config(config)?;
    validate_strategy_config(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    validate_initial_capital(config)?;
    validate_sizing(config)?;
    Ok(())
}

pub fn validate_risk_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    validate_fraction(config, "risk", "max_daily_loss", 0.05)?;
    validate_fraction(config, "risk", "max_position_size", 0.1)?;

    let leverage = config.get_double("risk", "max_leverage", 1.0);
    if !(leverage > 0.0 && leverage.is_finite()) {
        return Err(invalid("risk", "max_leverage", "max_leverage must be positive"));
    }

    let take_profit = config.get_double("risk", "take_profit_pct", 0.05);
    if !(take_profit > 0.0 && take_profit.is_finite()) {
        return Err(invalid(
            "risk",
            "take_profit_pct",
            "take_profit_pct must be positive",
        ));
    }

    if let Some(policy) = config.get_string("risk", "reopen_policy") {
        policy
            .parse::<ReopenPolicy>()
            .map_err(|reason| invalid("risk", "reopen_policy", reason))?;
    }
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let name = config
        .get_string("strategy", "name")
        .unwrap_or_else(|| "reversal".to_string());

    match name.trim().to_lowercase().as_str() {
        "reversal" => Ok(()),
        "rsi" => validate_rsi_band(config),
        "sma_cross" => validate_sma_cross(config),
        _ => Err(TradesimError::UnknownStrategy { name }),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let value = config.get_double("backtest", "initial_capital", 10_000.0);
    if value <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_sizing(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let sizing = config
        .get_string("backtest", "sizing")
        .unwrap_or_else(|| "full_balance".to_string());

    match sizing.trim().to_lowercase().as_str() {
        "full_balance" => Ok(()),
        "risk_managed" => {
            validate_fraction(config, "backtest", "risk_per_trade", 0.02)?;
            let stop = config.get_double("backtest", "stop_loss_pct", 0.02);
            if stop <= 0.0 || stop >= 1.0 {
                return Err(invalid(
                    "backtest",
                    "stop_loss_pct",
                    "stop_loss_pct must be between 0 and 1 (exclusive)",
                ));
            }
            Ok(())
        }
        other => Err(invalid(
            "backtest",
            "sizing",
            format!("expected 'full_balance' or 'risk_managed', got '{}'", other),
        )),
    }
}

fn validate_rsi_band(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    validate_period(config, "rsi_period", 14)?;

    let oversold = config.get_double("strategy", "oversold", 30.0);
    let overbought = config.get_double("strategy", "overbought", 70.0);
    if !(0.0..=100.0).contains(&oversold) {
        return Err(invalid("strategy", "oversold", "oversold must be in [0, 100]"));
    }
    if !(0.0..=100.0).contains(&overbought) {
        return Err(invalid(
            "strategy",
            "overbought",
            "overbought must be in [0, 100]",
        ));
    }
    if oversold >= overbought {
        return Err(invalid(
            "strategy",
            "oversold",
            "oversold must be below overbought",
        ));
    }
    Ok(())
}

fn validate_sma_cross(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let fast = validate_period(config, "fast_period", 20)?;
    let slow = validate_period(config, "slow_period", 50)?;
    if fast >= slow {
        return Err(invalid(
            "strategy",
            "fast_period",
            "fast_period must be shorter than slow_period",
        ));
    }
    Ok(())
}

fn validate_period(config: &dyn ConfigPort, key: &str, default: i64) -> Result<i64, TradesimError> {
    let value = config.get_int("strategy", key, default);
    if value < 1 {
        return Err(invalid(
            "strategy",
            key,
            format!("{} must be at least 1", key),
        ));
    }
    Ok(value)
}

/// Fractions of balance live in (0, 1].
fn validate_fraction(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<(), TradesimError> {
    let value = config.get_double(section, key, default);
    if !(value > 0.0 && value <= 1.0) {
        return Err(invalid(
            section,
            key,
            format!("{} must be between 0 and 1", key),
        ));
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> TradesimError {
    TradesimError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Names accepted by `[strategy] name`, for error messages and help text.
pub fn known_strategies() -> String {
    BuiltinStrategy::NAMES.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn empty_config_uses_valid_defaults() {
        let config = make_config("[backtest]\n");
        assert!(validate_all(&config).is_ok());
    }

    #[test]
    fn valid_full_config_passes() {
        let config = make_config(
            r#"
[backtest]
initial_capital = 25000.0
symbol = BTCUSDT
sizing = risk_managed
risk_per_trade = 0.01
stop_loss_pct = 0.03

[risk]
max_daily_loss = 0.05
max_position_size = 0.2
max_leverage = 2.0
take_profit_pct = 0.1
reopen_policy = reject
reset_loss_daily = true

[strategy]
name = rsi
rsi_period = 14
oversold = 25
overbought = 75
"#,
        );
        assert!(validate_all(&config).is_ok());
    }

    #[test]
    fn initial_capital_must_be_positive() {
        let config = make_config("[backtest]\ninitial_capital = -100\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, TradesimError::ConfigInvalid { key, .. } if key == "initial_capital")
        );
    }

    #[test]
    fn initial_capital_zero_fails() {
        let config = make_config("[backtest]\ninitial_capital = 0\n");
        assert!(validate_backtest_config(&config).is_err());
    }

    #[test]
    fn unknown_sizing_fails() {
        let config = make_config("[backtest]\nsizing = martingale\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, TradesimError::ConfigInvalid { key, .. } if key == "sizing"));
    }

    #[test]
    fn risk_managed_stop_loss_must_be_positive() {
        let config = make_config("[backtest]\nsizing = risk_managed\nstop_loss_pct = 0\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, TradesimError::ConfigInvalid { key, .. } if key == "stop_loss_pct")
        );
    }

    #[test]
    fn risk_per_trade_above_one_fails() {
        let config = make_config("[backtest]\nsizing = risk_managed\nrisk_per_trade = 1.5\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, TradesimError::ConfigInvalid { key, .. } if key == "risk_per_trade")
        );
    }

    #[test]
    fn stop_loss_ignored_in_full_balance_mode() {
        let config = make_config("[backtest]\nstop_loss_pct = -1\n");
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn max_position_size_out_of_range_fails() {
        let config = make_config("[risk]\nmax_position_size = 0\n");
        let err = validate_risk_config(&config).unwrap_err();
        assert!(
            matches!(err, TradesimError::ConfigInvalid { key, .. } if key == "max_position_size")
        );
    }

    #[test]
    fn max_daily_loss_above_one_fails() {
        let config = make_config("[risk]\nmax_daily_loss = 1.2\n");
        let err = validate_risk_config(&config).unwrap_err();
        assert!(
            matches!(err, TradesimError::ConfigInvalid { key, .. } if key == "max_daily_loss")
        );
    }

    #[test]
    fn unknown_reopen_policy_fails() {
        let config = make_config("[risk]\nreopen_policy = stack\n");
        let err = validate_risk_config(&config).unwrap_err();
        assert!(
            matches!(err, TradesimError::ConfigInvalid { key, .. } if key == "reopen_policy")
        );
    }

    #[test]
    fn unknown_strategy_fails() {
        let config = make_config("[strategy]\nname = moon\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, TradesimError::UnknownStrategy { name } if name == "moon"));
    }

    #[test]
    fn oversold_must_be_below_overbought() {
        let config = make_config("[strategy]\nname = rsi\noversold = 70\noverbought = 30\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, TradesimError::ConfigInvalid { key, .. } if key == "oversold"));
    }

    #[test]
    fn rsi_period_zero_fails() {
        let config = make_config("[strategy]\nname = rsi\nrsi_period = 0\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, TradesimError::ConfigInvalid { key, .. } if key == "rsi_period"));
    }

    #[test]
    fn fast_must_be_shorter_than_slow() {
        let config = make_config("[strategy]\nname = sma_cross\nfast_period = 50\nslow_period = 20\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, TradesimError::ConfigInvalid { key, .. } if key == "fast_period"));
    }

    #[test]
    fn strategy_name_is_case_insensitive() {
        let config = make_config("[strategy]\nname = SMA_Cross\n");
        assert!(validate_strategy_config(&config).is_ok());
    }

    #[test]
    fn known_strategies_lists_all() {
        assert_eq!(known_strategies(), "reversal, rsi, sma_cross");
    }
}

//! Run configuration files.
//!
//! ```toml
//! [backtest]
//! tickers = ["SPY"]
//! start_date = "2020-01-02"
//! end_date = "2023-12-29"
//! initial_cash = 100000
//!
//! [strategy]
//! kind = "covered_call"
//! ticker = "SPY"
//!
//! [sweep]
//! sma_short_windows = [10, 20]
//! sma_long_windows = [50, 200]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backtest::{BacktestConfig, BacktestError};
use crate::strategy::StrategyConfig;
use crate::sweep::StrategyGrid;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] BacktestError),

    #[error("Strategy ticker {0} is not in the backtest tickers")]
    UnknownStrategyTicker(String),
}

/// Everything needed for `run` and `sweep`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub backtest: BacktestConfig,
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub sweep: StrategyGrid,
}

impl RunConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backtest.validate()?;
        let ticker = self.strategy.ticker();
        if !self.backtest.tickers.iter().any(|t| t == ticker) {
            return Err(ConfigError::UnknownStrategyTicker(ticker.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use crate::data::CalendarPolicy;

    const EXAMPLE: &str = r#"
        [backtest]
        tickers = ["SPY", "QQQ"]
        start_date = "2020-01-02"
        end_date = "2020-12-31"
        initial_cash = 50000
        calendar_policy = "carry_forward"

        [strategy]
        kind = "covered_call"
        ticker = "SPY"
        strike_factor = 1.03
    "#;

    #[test]
    fn test_parse_full_config() {
        let config = RunConfig::from_toml_str(EXAMPLE).unwrap();

        assert_eq!(config.backtest.tickers, vec!["SPY", "QQQ"]);
        assert_eq!(config.backtest.start_date, NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
        assert_eq!(config.backtest.initial_cash, dec!(50000));
        assert_eq!(config.backtest.risk_free_rate, 0.05);
        assert_eq!(config.backtest.volatility_window, 30);
        assert_eq!(config.backtest.calendar_policy, CalendarPolicy::CarryForward);
        assert_eq!(config.strategy.label(), "covered_call_k1.03_d15");
        // sweep section falls back to the default grid
        assert!(!config.sweep.sma_short_windows.is_empty());
    }

    #[test]
    fn test_strategy_ticker_must_be_loaded() {
        let text = EXAMPLE.replace(r#"ticker = "SPY""#, r#"ticker = "IWM""#);
        assert!(matches!(
            RunConfig::from_toml_str(&text),
            Err(ConfigError::UnknownStrategyTicker(_))
        ));
    }

    #[test]
    fn test_invalid_dates_rejected() {
        let text = EXAMPLE.replace("2020-12-31", "2019-12-31");
        assert!(matches!(
            RunConfig::from_toml_str(&text),
            Err(ConfigError::Invalid(BacktestError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            RunConfig::load("/nonexistent/optbench.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}

//! Strategy parameter grids.

use serde::{Deserialize, Serialize};

use crate::strategy::{BuyAndHoldConfig, SmaCrossoverConfig, StrategyConfig, WheelConfig};

/// One strategy configuration to run in a sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepCase {
    pub label: String,
    pub strategy: StrategyConfig,
}

impl SweepCase {
    pub fn new(strategy: StrategyConfig) -> Self {
        Self {
            label: strategy.label(),
            strategy,
        }
    }
}

/// Parameter values to sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyGrid {
    /// SMA short window values.
    #[serde(default)]
    pub sma_short_windows: Vec<usize>,
    /// SMA long window values.
    #[serde(default)]
    pub sma_long_windows: Vec<usize>,
    /// Wheel put strike factors.
    #[serde(default)]
    pub wheel_put_strike_factors: Vec<f64>,
    /// Wheel call strike factors.
    #[serde(default)]
    pub wheel_call_strike_factors: Vec<f64>,
    /// Add a buy-and-hold baseline.
    #[serde(default = "default_include_baseline")]
    pub include_baseline: bool,
}

fn default_include_baseline() -> bool {
    true
}

impl Default for StrategyGrid {
    fn default() -> Self {
        Self {
            sma_short_windows: vec![10, 20, 50],
            sma_long_windows: vec![50, 100, 200],
            wheel_put_strike_factors: vec![0.90, 0.95, 0.98],
            wheel_call_strike_factors: vec![1.02, 1.05, 1.10],
            include_baseline: true,
        }
    }
}

impl StrategyGrid {
    /// An empty grid, to be filled with the builder methods.
    pub fn empty() -> Self {
        Self {
            sma_short_windows: Vec::new(),
            sma_long_windows: Vec::new(),
            wheel_put_strike_factors: Vec::new(),
            wheel_call_strike_factors: Vec::new(),
            include_baseline: false,
        }
    }

    pub fn with_sma_windows(mut self, short: &[usize], long: &[usize]) -> Self {
        self.sma_short_windows = short.to_vec();
        self.sma_long_windows = long.to_vec();
        self
    }

    pub fn with_wheel_strikes(mut self, put: &[f64], call: &[f64]) -> Self {
        self.wheel_put_strike_factors = put.to_vec();
        self.wheel_call_strike_factors = call.to_vec();
        self
    }

    pub fn with_baseline(mut self, include: bool) -> Self {
        self.include_baseline = include;
        self
    }

    /// Generate every case for `ticker`.
    ///
    /// SMA pairs whose long window does not exceed the short window are
    /// skipped.
    pub fn cases(&self, ticker: &str) -> Vec<SweepCase> {
        let mut cases = Vec::new();

        if self.include_baseline {
            cases.push(SweepCase::new(StrategyConfig::BuyAndHold(BuyAndHoldConfig {
                ticker: ticker.to_string(),
            })));
        }

        for &short in &self.sma_short_windows {
            for &long in &self.sma_long_windows {
                if long <= short || short == 0 {
                    continue;
                }
                cases.push(SweepCase::new(StrategyConfig::SmaCrossover(
                    SmaCrossoverConfig::new(ticker, short, long),
                )));
            }
        }

        for &put in &self.wheel_put_strike_factors {
            for &call in &self.wheel_call_strike_factors {
                cases.push(SweepCase::new(StrategyConfig::Wheel(WheelConfig {
                    put_strike_factor: put,
                    call_strike_factor: call,
                    ..WheelConfig::new(ticker)
                })));
            }
        }

        cases
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_pairs_skip_inverted_windows() {
        let grid = StrategyGrid::empty().with_sma_windows(&[10, 50], &[20, 50, 200]);
        let labels: Vec<_> = grid.cases("SPY").into_iter().map(|c| c.label).collect();
        assert_eq!(labels, vec!["sma_10_20", "sma_10_50", "sma_10_200", "sma_50_200"]);
    }

    #[test]
    fn test_default_grid_size() {
        let grid = StrategyGrid::default();
        // baseline + 8 valid SMA pairs (10/50, 10/100, 10/200, 20/50, 20/100, 20/200, 50/100, 50/200) + 9 wheels
        assert_eq!(grid.cases("SPY").len(), 1 + 8 + 9);
    }

    #[test]
    fn test_wheel_cases_keep_other_defaults() {
        let grid = StrategyGrid::empty().with_wheel_strikes(&[0.9], &[1.1]);
        let cases = grid.cases("QQQ");
        assert_eq!(cases.len(), 1);
        match &cases[0].strategy {
            StrategyConfig::Wheel(c) => {
                assert_eq!(c.ticker, "QQQ");
                assert_eq!(c.put_strike_factor, 0.9);
                assert_eq!(c.days_to_expiration, 30);
            }
            other => panic!("unexpected config {:?}", other),
        }
    }
}

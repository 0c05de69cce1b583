//! Parallel sweep runner.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backtest::engine::trading_calendar;
use crate::backtest::{Backtest, BacktestConfig, BacktestError};
use crate::data::MarketData;
use crate::metrics::SummaryStatistics;

use super::grid::SweepCase;

/// Outcome of one sweep case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResult {
    pub label: String,
    pub strategy: String,
    pub transactions: usize,
    pub statistics: SummaryStatistics,
}

type ProgressHook = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Runs many strategy configurations over one shared data set.
///
/// Each case gets its own [`Backtest`], so portfolios and transaction logs
/// are never shared between runs.
pub struct SweepRunner {
    config: BacktestConfig,
    market: Arc<MarketData>,
    progress: Option<ProgressHook>,
}

impl SweepRunner {
    /// Fails when no case could start: invalid config, a strict-policy
    /// calendar mismatch, or no trading days in the window.
    pub fn new(config: BacktestConfig, market: Arc<MarketData>) -> Result<Self, BacktestError> {
        trading_calendar(&config, &market)?;
        Ok(Self {
            config,
            market,
            progress: None,
        })
    }

    /// Called with `(finished, total)` after every case.
    pub fn with_progress<F>(mut self, hook: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(hook));
        self
    }

    /// Run every case in parallel. Results are sorted by Sharpe ratio,
    /// best first; cases that fail to start are logged and left out.
    pub fn run(&self, cases: &[SweepCase]) -> Vec<SweepResult> {
        let total = cases.len();
        let done = AtomicUsize::new(0);
        info!("Running {} sweep cases", total);

        let mut results: Vec<SweepResult> = cases
            .par_iter()
            .filter_map(|case| {
                let result = self.run_case(case);

                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(hook) = &self.progress {
                    hook(finished, total);
                }
                if finished % (total / 10).max(1) == 0 || finished == total {
                    let pct = finished as f64 / total as f64 * 100.0;
                    info!("  Sweep {:.0}% ({}/{} cases)", pct, finished, total);
                }

                result
            })
            .collect();

        results.sort_by(|a, b| {
            b.statistics
                .sharpe_ratio
                .partial_cmp(&a.statistics.sharpe_ratio)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.label.cmp(&b.label))
        });

        if let Some(best) = results.first() {
            info!(
                "Sweep complete: best = {}, Sharpe = {:.2}",
                best.label, best.statistics.sharpe_ratio
            );
        }

        results
    }

    fn run_case(&self, case: &SweepCase) -> Option<SweepResult> {
        let strategy = case.strategy.build();
        let name = strategy.name().to_string();

        let mut backtest =
            match Backtest::with_market_data(self.config.clone(), strategy, Arc::clone(&self.market)) {
                Ok(b) => b,
                Err(e) => {
                    warn!(case = case.label.as_str(), error = %e, "Sweep case skipped");
                    return None;
                }
            };
        backtest.run();

        Some(SweepResult {
            label: case.label.clone(),
            strategy: name,
            transactions: backtest.transactions().len(),
            statistics: backtest.summary_statistics(),
        })
    }
}

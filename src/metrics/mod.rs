//! Performance metrics module.
//!
//! - Total return, CAGR
//! - Sharpe and Sortino ratios, annualized volatility
//! - Maximum drawdown with peak, trough and recovery dates

pub mod calculator;

pub use calculator::{
    cagr_pct, daily_returns, sortino_ratio, DrawdownAnalysis, SummaryStatistics,
    ANNUALIZATION_DAYS,
};

//! Event-driven backtesting for equity and options strategies.
//!
//! - Transaction ledger
//! - Trading actions (the only path that mutates a portfolio)
//! - Day-by-day simulation with expiration handling and mark-to-market

pub mod actions;
pub mod engine;
pub mod transaction;

pub use actions::TradingActions;
pub use engine::{Backtest, BacktestConfig, BacktestError, ValuationSnapshot};
pub use transaction::{Transaction, TransactionKind};

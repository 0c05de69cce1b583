pub mod backtest;
pub mod config;
pub mod data;
pub mod metrics;
pub mod portfolio;
pub mod pricing;
pub mod regime;
pub mod strategy;
pub mod sweep;

// Re-export commonly used types
pub use backtest::{Backtest, BacktestConfig, BacktestError, TradingActions, Transaction, TransactionKind, ValuationSnapshot};
pub use config::{ConfigError, RunConfig};
pub use data::{CalendarPolicy, DataLoader, InMemoryMarketData, MarketData, OptionType};
pub use metrics::{DrawdownAnalysis, SummaryStatistics};
pub use portfolio::{OptionContract, OptionDirection, Portfolio, Position};
pub use pricing::BlackScholes;
pub use regime::{RegimeClassifier, VolatilityRegime};
pub use strategy::{MarketSnapshot, Strategy, StrategyConfig};
pub use sweep::{StrategyGrid, SweepCase, SweepResult, SweepRunner};

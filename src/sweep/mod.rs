//! Parameter sweeps.
//!
//! Runs a grid of strategy configurations over one preloaded data set in
//! parallel and ranks them by Sharpe ratio.

pub mod grid;
pub mod runner;

pub use grid::{StrategyGrid, SweepCase};
pub use runner::{SweepResult, SweepRunner};

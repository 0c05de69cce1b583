//! Market regime classification module.
//!
//! Splits market conditions by recent realized volatility:
//! - Calm: trailing return std at or below threshold
//! - Turbulent: trailing return std above threshold

pub mod classifier;

pub use classifier::{RegimeClassifier, RegimeClassifierConfig, VolatilityRegime};

//! Volatility regime classifier.
//!
//! Uses the dispersion of recent daily returns to split the market into calm
//! and turbulent regimes. Trend-following strategies ask for more
//! confirmation before acting in a turbulent regime.

use serde::{Deserialize, Serialize};

use crate::strategy::indicators::{pct_returns, sample_std};

/// Volatility regime classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolatilityRegime {
    /// Recent return dispersion at or below the threshold.
    Calm,
    /// Recent return dispersion above the threshold.
    Turbulent,
}

impl VolatilityRegime {
    /// Consecutive confirming days required before acting on a signal.
    pub fn required_confirmation(&self) -> u32 {
        match self {
            Self::Calm => 1,
            Self::Turbulent => 3,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Calm => "Low volatility, act on first signal",
            Self::Turbulent => "High volatility, wait for confirmation",
        }
    }
}

/// Regime classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeClassifierConfig {
    /// Daily return standard deviation above which the regime is turbulent.
    pub volatility_threshold: f64,
    /// Number of trailing daily returns measured.
    pub lookback: usize,
}

impl Default for RegimeClassifierConfig {
    fn default() -> Self {
        Self {
            volatility_threshold: 0.02,
            lookback: 20,
        }
    }
}

/// Volatility regime classifier.
#[derive(Debug, Clone)]
pub struct RegimeClassifier {
    config: RegimeClassifierConfig,
}

impl RegimeClassifier {
    pub fn new(config: RegimeClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RegimeClassifierConfig {
        &self.config
    }

    /// Sample standard deviation of the trailing `lookback` daily returns.
    ///
    /// Returns 0.0 while fewer than `lookback` returns are available.
    pub fn recent_volatility(&self, closes: &[f64]) -> f64 {
        let returns = pct_returns(closes);
        if returns.len() < self.config.lookback || self.config.lookback == 0 {
            return 0.0;
        }
        sample_std(&returns[returns.len() - self.config.lookback..]).unwrap_or(0.0)
    }

    /// Classify the regime at the end of `closes`.
    pub fn classify(&self, closes: &[f64]) -> VolatilityRegime {
        if self.recent_volatility(closes) > self.config.volatility_threshold {
            VolatilityRegime::Turbulent
        } else {
            VolatilityRegime::Calm
        }
    }
}

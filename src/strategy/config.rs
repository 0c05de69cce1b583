//! Serializable strategy selection.

use serde::{Deserialize, Serialize};

use super::{
    AdaptiveMaConfig, AdaptiveMovingAverage, BuyAndHold, BuyAndHoldConfig, CoveredCall,
    CoveredCallConfig, EmaCrossover, EmaCrossoverConfig, Leap, LeapConfig, SmaCrossover,
    SmaCrossoverConfig, Strategy, TripleMaConfig, TripleMovingAverage, Wheel, WheelConfig,
};

/// Strategy choice plus its parameters, tagged by `kind`.
///
/// ```toml
/// [strategy]
/// kind = "wheel"
/// ticker = "SPY"
/// put_strike_factor = 0.95
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    BuyAndHold(BuyAndHoldConfig),
    CoveredCall(CoveredCallConfig),
    Leap(LeapConfig),
    Wheel(WheelConfig),
    SmaCrossover(SmaCrossoverConfig),
    EmaCrossover(EmaCrossoverConfig),
    TripleMovingAverage(TripleMaConfig),
    AdaptiveMovingAverage(AdaptiveMaConfig),
}

impl StrategyConfig {
    /// Instantiate a fresh strategy.
    pub fn build(&self) -> Box<dyn Strategy> {
        match self {
            Self::BuyAndHold(c) => Box::new(BuyAndHold::new(c.clone())),
            Self::CoveredCall(c) => Box::new(CoveredCall::new(c.clone())),
            Self::Leap(c) => Box::new(Leap::new(c.clone())),
            Self::Wheel(c) => Box::new(Wheel::new(c.clone())),
            Self::SmaCrossover(c) => Box::new(SmaCrossover::new(c.clone())),
            Self::EmaCrossover(c) => Box::new(EmaCrossover::new(c.clone())),
            Self::TripleMovingAverage(c) => Box::new(TripleMovingAverage::new(c.clone())),
            Self::AdaptiveMovingAverage(c) => Box::new(AdaptiveMovingAverage::new(c.clone())),
        }
    }

    pub fn ticker(&self) -> &str {
        match self {
            Self::BuyAndHold(c) => &c.ticker,
            Self::CoveredCall(c) => &c.ticker,
            Self::Leap(c) => &c.ticker,
            Self::Wheel(c) => &c.ticker,
            Self::SmaCrossover(c) => &c.ticker,
            Self::EmaCrossover(c) => &c.ticker,
            Self::TripleMovingAverage(c) => &c.ticker,
            Self::AdaptiveMovingAverage(c) => &c.ticker,
        }
    }

    /// Short label including the main parameters, used in sweep output.
    pub fn label(&self) -> String {
        match self {
            Self::BuyAndHold(_) => "buy_and_hold".to_string(),
            Self::CoveredCall(c) => format!(
                "covered_call_k{:.2}_d{}",
                c.strike_factor, c.days_to_expiration
            ),
            Self::Leap(c) => format!(
                "leap_k{:.2}_d{}_roll{}",
                c.strike_factor, c.days_to_expiration, c.roll_threshold_days
            ),
            Self::Wheel(c) => format!(
                "wheel_p{:.2}_c{:.2}_d{}",
                c.put_strike_factor, c.call_strike_factor, c.days_to_expiration
            ),
            Self::SmaCrossover(c) => format!("sma_{}_{}", c.short_window, c.long_window),
            Self::EmaCrossover(c) => format!("ema_{}_{}", c.short_window, c.long_window),
            Self::TripleMovingAverage(c) => format!(
                "triple_{}_{}_{}",
                c.fast_window, c.medium_window, c.slow_window
            ),
            Self::AdaptiveMovingAverage(c) => format!(
                "adaptive_{}_{}_v{:.3}",
                c.short_window, c.long_window, c.volatility_threshold
            ),
        }
    }
}

//! Moving-average crossover strategies.
//!
//! All variants go long with `allocation` of cash on a bullish signal and
//! sell the whole position on a bearish one. No signal is produced until the
//! history covers the longest window.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::backtest::TradingActions;
use crate::regime::{RegimeClassifier, RegimeClassifierConfig};

use super::indicators::{ema, sma};
use super::{affordable_shares, to_decimal, MarketSnapshot, Strategy};

fn default_allocation() -> f64 {
    1.0
}

/// Crossover bookkeeping carried from one day to the next.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossoverState {
    pub prev_short: Option<f64>,
    pub prev_long: Option<f64>,
    pub in_position: bool,
    /// Consecutive days the current signal has held.
    pub confirmation_days: u32,
}

impl CrossoverState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn previous(&self) -> Option<(f64, f64)> {
        self.prev_short.zip(self.prev_long)
    }

    /// Short average moved from at-or-below to above the long average.
    pub fn golden_cross(&self, short: f64, long: f64) -> bool {
        self.previous()
            .is_some_and(|(ps, pl)| ps <= pl && short > long)
    }

    /// Short average moved from at-or-above to below the long average.
    pub fn death_cross(&self, short: f64, long: f64) -> bool {
        self.previous()
            .is_some_and(|(ps, pl)| ps >= pl && short < long)
    }

    pub fn update(&mut self, short: f64, long: f64) {
        self.prev_short = Some(short);
        self.prev_long = Some(long);
    }
}

/// Buy with `allocation` of cash. Returns whether anything was bought.
fn enter(actions: &mut TradingActions<'_>, ticker: &str, price: Decimal, allocation: f64) -> bool {
    let cash = actions.portfolio().cash() * to_decimal(allocation);
    let shares = affordable_shares(cash, price);
    shares > Decimal::ZERO && actions.buy_stock(ticker, shares, price)
}

/// Sell the full position. Returns whether anything was sold.
fn exit(actions: &mut TradingActions<'_>, ticker: &str, price: Decimal) -> bool {
    let shares = actions.portfolio().shares_held(ticker);
    shares > Decimal::ZERO && actions.sell_stock(ticker, shares, price)
}

/// Apply golden/death cross signals to the crossover state.
fn apply_crossover(
    state: &mut CrossoverState,
    actions: &mut TradingActions<'_>,
    ticker: &str,
    price: Decimal,
    allocation: f64,
    short: f64,
    long: f64,
) {
    if state.golden_cross(short, long) && !state.in_position {
        if enter(actions, ticker, price, allocation) {
            state.in_position = true;
        }
    } else if state.death_cross(short, long) && state.in_position && exit(actions, ticker, price) {
        state.in_position = false;
    }
    state.update(short, long);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmaCrossoverConfig {
    pub ticker: String,
    #[serde(default = "default_sma_short")]
    pub short_window: usize,
    #[serde(default = "default_sma_long")]
    pub long_window: usize,
    #[serde(default = "default_allocation")]
    pub allocation: f64,
}

fn default_sma_short() -> usize {
    50
}

fn default_sma_long() -> usize {
    200
}

impl SmaCrossoverConfig {
    pub fn new(ticker: &str, short_window: usize, long_window: usize) -> Self {
        Self {
            ticker: ticker.to_string(),
            short_window,
            long_window,
            allocation: default_allocation(),
        }
    }
}

/// Simple moving-average crossover (golden/death cross).
#[derive(Debug, Clone)]
pub struct SmaCrossover {
    config: SmaCrossoverConfig,
    state: CrossoverState,
}

impl SmaCrossover {
    pub fn new(config: SmaCrossoverConfig) -> Self {
        Self {
            config,
            state: CrossoverState::default(),
        }
    }

    pub fn state(&self) -> &CrossoverState {
        &self.state
    }
}

impl Strategy for SmaCrossover {
    fn name(&self) -> &str {
        "sma_crossover"
    }

    fn on_day(&mut self, market: &MarketSnapshot<'_>, actions: &mut TradingActions<'_>) {
        let ticker = self.config.ticker.as_str();
        let Some(price) = market.price(ticker) else {
            return;
        };
        let closes = market.close_values(ticker);
        let (Some(short), Some(long)) = (
            sma(&closes, self.config.short_window),
            sma(&closes, self.config.long_window),
        ) else {
            return;
        };

        apply_crossover(
            &mut self.state,
            actions,
            ticker,
            price,
            self.config.allocation,
            short,
            long,
        );
    }

    fn reset(&mut self) {
        self.state.reset();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmaCrossoverConfig {
    pub ticker: String,
    #[serde(default = "default_ema_short")]
    pub short_window: usize,
    #[serde(default = "default_ema_long")]
    pub long_window: usize,
    #[serde(default = "default_allocation")]
    pub allocation: f64,
}

fn default_ema_short() -> usize {
    12
}

fn default_ema_long() -> usize {
    26
}

impl EmaCrossoverConfig {
    pub fn new(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            short_window: default_ema_short(),
            long_window: default_ema_long(),
            allocation: default_allocation(),
        }
    }
}

/// Exponential moving-average crossover.
#[derive(Debug, Clone)]
pub struct EmaCrossover {
    config: EmaCrossoverConfig,
    state: CrossoverState,
}

impl EmaCrossover {
    pub fn new(config: EmaCrossoverConfig) -> Self {
        Self {
            config,
            state: CrossoverState::default(),
        }
    }
}

impl Strategy for EmaCrossover {
    fn name(&self) -> &str {
        "ema_crossover"
    }

    fn on_day(&mut self, market: &MarketSnapshot<'_>, actions: &mut TradingActions<'_>) {
        let ticker = self.config.ticker.as_str();
        let Some(price) = market.price(ticker) else {
            return;
        };
        let closes = market.close_values(ticker);
        if closes.len() < self.config.long_window {
            return;
        }
        let (Some(short), Some(long)) = (
            ema(&closes, self.config.short_window),
            ema(&closes, self.config.long_window),
        ) else {
            return;
        };

        apply_crossover(
            &mut self.state,
            actions,
            ticker,
            price,
            self.config.allocation,
            short,
            long,
        );
    }

    fn reset(&mut self) {
        self.state.reset();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripleMaConfig {
    pub ticker: String,
    #[serde(default = "default_fast")]
    pub fast_window: usize,
    #[serde(default = "default_medium")]
    pub medium_window: usize,
    #[serde(default = "default_slow")]
    pub slow_window: usize,
    #[serde(default = "default_allocation")]
    pub allocation: f64,
}

fn default_fast() -> usize {
    10
}

fn default_medium() -> usize {
    50
}

fn default_slow() -> usize {
    200
}

impl TripleMaConfig {
    pub fn new(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            fast_window: default_fast(),
            medium_window: default_medium(),
            slow_window: default_slow(),
            allocation: default_allocation(),
        }
    }
}

/// Enter on fast > medium > slow, exit when fast drops below medium.
#[derive(Debug, Clone)]
pub struct TripleMovingAverage {
    config: TripleMaConfig,
    in_position: bool,
}

impl TripleMovingAverage {
    pub fn new(config: TripleMaConfig) -> Self {
        Self {
            config,
            in_position: false,
        }
    }
}

impl Strategy for TripleMovingAverage {
    fn name(&self) -> &str {
        "triple_moving_average"
    }

    fn on_day(&mut self, market: &MarketSnapshot<'_>, actions: &mut TradingActions<'_>) {
        let ticker = self.config.ticker.as_str();
        let Some(price) = market.price(ticker) else {
            return;
        };
        let closes = market.close_values(ticker);
        if closes.len() < self.config.slow_window {
            return;
        }
        let (Some(fast), Some(medium), Some(slow)) = (
            sma(&closes, self.config.fast_window),
            sma(&closes, self.config.medium_window),
            sma(&closes, self.config.slow_window),
        ) else {
            return;
        };

        if fast > medium && medium > slow && !self.in_position {
            if enter(actions, ticker, price, self.config.allocation) {
                self.in_position = true;
            }
        } else if fast < medium && self.in_position && exit(actions, ticker, price) {
            self.in_position = false;
        }
    }

    fn reset(&mut self) {
        self.in_position = false;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptiveMaConfig {
    pub ticker: String,
    #[serde(default = "default_adaptive_short")]
    pub short_window: usize,
    #[serde(default = "default_adaptive_long")]
    pub long_window: usize,
    #[serde(default = "default_allocation")]
    pub allocation: f64,
    /// Daily return std above which two extra confirming days are needed.
    #[serde(default = "default_volatility_threshold")]
    pub volatility_threshold: f64,
}

fn default_adaptive_short() -> usize {
    20
}

fn default_adaptive_long() -> usize {
    50
}

fn default_volatility_threshold() -> f64 {
    0.02
}

impl AdaptiveMaConfig {
    pub fn new(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            short_window: default_adaptive_short(),
            long_window: default_adaptive_long(),
            allocation: default_allocation(),
            volatility_threshold: default_volatility_threshold(),
        }
    }
}

/// SMA crossover that waits for confirmation in turbulent markets.
#[derive(Debug, Clone)]
pub struct AdaptiveMovingAverage {
    config: AdaptiveMaConfig,
    state: CrossoverState,
    classifier: RegimeClassifier,
}

impl AdaptiveMovingAverage {
    pub fn new(config: AdaptiveMaConfig) -> Self {
        let classifier = RegimeClassifier::new(RegimeClassifierConfig {
            volatility_threshold: config.volatility_threshold,
            ..RegimeClassifierConfig::default()
        });
        Self {
            config,
            state: CrossoverState::default(),
            classifier,
        }
    }

    pub fn state(&self) -> &CrossoverState {
        &self.state
    }

    /// Count today toward the streak: continue it when yesterday agreed,
    /// otherwise start a new one.
    fn confirm(&mut self, continuing: bool) -> u32 {
        self.state.confirmation_days = if continuing {
            self.state.confirmation_days + 1
        } else {
            1
        };
        self.state.confirmation_days
    }
}

impl Strategy for AdaptiveMovingAverage {
    fn name(&self) -> &str {
        "adaptive_moving_average"
    }

    fn on_day(&mut self, market: &MarketSnapshot<'_>, actions: &mut TradingActions<'_>) {
        let ticker = self.config.ticker.clone();
        let Some(price) = market.price(&ticker) else {
            return;
        };
        let closes = market.close_values(&ticker);
        let (Some(short), Some(long)) = (
            sma(&closes, self.config.short_window),
            sma(&closes, self.config.long_window),
        ) else {
            return;
        };
        let required = self.classifier.classify(&closes).required_confirmation();

        if let Some((prev_short, prev_long)) = self.state.previous() {
            if short > long && !self.state.in_position {
                let streak = self.confirm(prev_short > prev_long);
                if streak >= required && enter(actions, &ticker, price, self.config.allocation) {
                    self.state.in_position = true;
                    self.state.confirmation_days = 0;
                }
            } else if short < long && self.state.in_position {
                let streak = self.confirm(prev_short < prev_long);
                if streak >= required && exit(actions, &ticker, price) {
                    self.state.in_position = false;
                    self.state.confirmation_days = 0;
                }
            } else {
                self.state.confirmation_days = 0;
            }
        }

        self.state.update(short, long);
    }

    fn reset(&mut self) {
        self.state.reset();
    }
}

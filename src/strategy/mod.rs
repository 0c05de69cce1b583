//! Trading strategies.
//!
//! A strategy is called once per simulated day with a [`MarketSnapshot`] and
//! a [`TradingActions`] context. All effects go through the context; the
//! portfolio is read through `actions.portfolio()`.
//!
//! Variants:
//! - Buy and hold
//! - Covered call
//! - LEAP (long-dated calls, rolled near expiry)
//! - Wheel (cash-secured puts, then covered calls)
//! - Moving-average crossovers: SMA, EMA, triple MA, volatility-adaptive

pub mod buy_and_hold;
pub mod config;
pub mod covered_call;
pub mod indicators;
pub mod leap;
pub mod moving_average;
pub mod snapshot;
pub mod wheel;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::backtest::TradingActions;
use crate::portfolio::contract_shares;

pub use buy_and_hold::{BuyAndHold, BuyAndHoldConfig};
pub use config::StrategyConfig;
pub use covered_call::{CoveredCall, CoveredCallConfig};
pub use leap::{Leap, LeapConfig};
pub use moving_average::{
    AdaptiveMaConfig, AdaptiveMovingAverage, CrossoverState, EmaCrossover, EmaCrossoverConfig,
    SmaCrossover, SmaCrossoverConfig, TripleMaConfig, TripleMovingAverage,
};
pub use snapshot::MarketSnapshot;
pub use wheel::{Wheel, WheelConfig};

/// Daily decision callback.
pub trait Strategy: Send {
    fn name(&self) -> &str;

    /// Make the day's decisions. Runs after expirations are resolved and
    /// before the portfolio is revalued.
    fn on_day(&mut self, market: &MarketSnapshot<'_>, actions: &mut TradingActions<'_>);

    /// Clear state carried between days.
    fn reset(&mut self) {}
}

/// Convert an `f64` factor or price to `Decimal`, 0 when not representable.
pub(crate) fn to_decimal(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or(Decimal::ZERO)
}

pub(crate) fn to_f64(value: Decimal) -> f64 {
    value.try_into().unwrap_or(0.0)
}

/// Whole shares affordable with `cash` at `price`.
pub fn affordable_shares(cash: Decimal, price: Decimal) -> Decimal {
    if price <= Decimal::ZERO || cash <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (cash / price).floor()
}

/// Whole contracts affordable when each share of notional costs
/// `per_share`.
pub fn affordable_contracts(cash: Decimal, per_share: Decimal) -> u32 {
    let per_contract = per_share * contract_shares(1);
    if per_contract <= Decimal::ZERO || cash <= Decimal::ZERO {
        return 0;
    }
    (cash / per_contract).floor().to_u32().unwrap_or(0)
}

/// Whole contracts covered by `shares`.
pub fn covered_contracts(shares: Decimal) -> u32 {
    if shares <= Decimal::ZERO {
        return 0;
    }
    (shares / contract_shares(1)).floor().to_u32().unwrap_or(0)
}

//! Covered call: hold stock and write out-of-the-money calls against it.

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::backtest::TradingActions;
use crate::data::OptionType;
use crate::pricing::BlackScholes;

use super::{affordable_shares, covered_contracts, to_decimal, to_f64, MarketSnapshot, Strategy};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoveredCallConfig {
    pub ticker: String,
    /// Strike as a multiple of the current price.
    #[serde(default = "default_strike_factor")]
    pub strike_factor: f64,
    #[serde(default = "default_days_to_expiration")]
    pub days_to_expiration: i64,
    #[serde(default = "default_interest_rate")]
    pub interest_rate: f64,
}

fn default_strike_factor() -> f64 {
    1.06
}

fn default_days_to_expiration() -> i64 {
    15
}

pub(crate) fn default_interest_rate() -> f64 {
    0.05
}

impl CoveredCallConfig {
    pub fn new(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            strike_factor: default_strike_factor(),
            days_to_expiration: default_days_to_expiration(),
            interest_rate: default_interest_rate(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoveredCall {
    config: CoveredCallConfig,
    pricer: BlackScholes,
}

impl CoveredCall {
    pub fn new(config: CoveredCallConfig) -> Self {
        let pricer = BlackScholes::new(config.interest_rate);
        Self { config, pricer }
    }
}

impl Strategy for CoveredCall {
    fn name(&self) -> &str {
        "covered_call"
    }

    fn on_day(&mut self, market: &MarketSnapshot<'_>, actions: &mut TradingActions<'_>) {
        let ticker = self.config.ticker.as_str();
        let Some(price) = market.price(ticker) else {
            return;
        };

        // 1. Put idle cash into shares
        let shares = affordable_shares(actions.portfolio().cash(), price);
        if shares > Decimal::ZERO {
            actions.buy_stock(ticker, shares, price);
        }

        // 2. Write calls when none is open on the ticker
        if actions.portfolio().has_option(ticker, OptionType::Call, None) {
            return;
        }
        let contracts = covered_contracts(actions.portfolio().shares_held(ticker));
        if contracts == 0 {
            return;
        }
        let Some(sigma) = market.latest_volatility(ticker) else {
            return;
        };

        let strike = price * to_decimal(self.config.strike_factor);
        let expiration = market.date() + Duration::days(self.config.days_to_expiration);
        let premium = self.pricer.premium(
            OptionType::Call,
            to_f64(price),
            to_f64(strike),
            sigma,
            self.config.days_to_expiration,
        );

        actions.sell_call(ticker, strike, expiration, contracts, to_decimal(premium));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use crate::data::{MarketData, VolatilitySeries};
    use crate::portfolio::{Portfolio, PriceMap};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn market_with_vol() -> MarketData {
        let vol: VolatilitySeries = vec![(day(1), 0.3)].into_iter().collect();
        MarketData::from_parts(
            vec!["SPY".to_string()],
            HashMap::new(),
            HashMap::from([("SPY".to_string(), vol)]),
        )
    }

    #[test]
    fn test_buys_then_writes_call() {
        let market = market_with_vol();
        let mut strategy = CoveredCall::new(CoveredCallConfig::new("SPY"));
        let mut portfolio = Portfolio::new(dec!(25_050));
        let mut log = Vec::new();

        let prices = PriceMap::from([("SPY".to_string(), dec!(100))]);
        let snapshot = MarketSnapshot::new(day(1), &prices, &market);
        let mut actions = TradingActions::new(day(1), &mut portfolio, &mut log);
        strategy.on_day(&snapshot, &mut actions);

        let call = &portfolio.options()[0];
        assert_eq!(call.contracts, 2);
        assert_eq!(call.strike, dec!(106));
        assert_eq!(call.expiration, day(16));
        assert!(call.premium_received > dec!(0));
        // premium bounded by the underlying
        assert!(call.premium_received < dec!(100) * dec!(200));
        assert_eq!(portfolio.shares_held("SPY"), dec!(250));
    }

    #[test]
    fn test_open_call_blocks_new_sale() {
        let market = market_with_vol();
        let mut strategy = CoveredCall::new(CoveredCallConfig::new("SPY"));
        let mut portfolio = Portfolio::new(dec!(10_000));
        let mut log = Vec::new();
        let prices = PriceMap::from([("SPY".to_string(), dec!(100))]);

        for d in [1, 2, 3] {
            let snapshot = MarketSnapshot::new(day(d), &prices, &market);
            let mut actions = TradingActions::new(day(d), &mut portfolio, &mut log);
            strategy.on_day(&snapshot, &mut actions);
        }

        assert_eq!(portfolio.options().len(), 1);
    }

    #[test]
    fn test_no_volatility_no_call() {
        let market = MarketData::from_parts(vec!["SPY".to_string()], HashMap::new(), HashMap::new());
        let mut strategy = CoveredCall::new(CoveredCallConfig::new("SPY"));
        let mut portfolio = Portfolio::new(dec!(10_000));
        let mut log = Vec::new();

        let prices = PriceMap::from([("SPY".to_string(), dec!(100))]);
        let snapshot = MarketSnapshot::new(day(1), &prices, &market);
        let mut actions = TradingActions::new(day(1), &mut portfolio, &mut log);
        strategy.on_day(&snapshot, &mut actions);

        assert!(portfolio.options().is_empty());
        assert_eq!(portfolio.shares_held("SPY"), dec!(100));
    }
}

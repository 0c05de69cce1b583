//! Wheel strategy.
//!
//! Cycles between two phases on one underlying:
//! 1. No stock and no short put: sell cash-secured puts
//! 2. Holding stock (after assignment) and no short call: sell covered calls
//!
//! When the calls are assigned the stock is called away and the cycle starts
//! again. Trades whose premium is below `min_premium_ratio` of the price are
//! skipped.

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::backtest::TradingActions;
use crate::data::OptionType;
use crate::portfolio::OptionDirection;
use crate::pricing::BlackScholes;

use super::covered_call::default_interest_rate;
use super::{affordable_contracts, covered_contracts, to_decimal, to_f64, MarketSnapshot, Strategy};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WheelConfig {
    pub ticker: String,
    #[serde(default = "default_put_strike_factor")]
    pub put_strike_factor: f64,
    #[serde(default = "default_call_strike_factor")]
    pub call_strike_factor: f64,
    #[serde(default = "default_days_to_expiration")]
    pub days_to_expiration: i64,
    #[serde(default = "default_interest_rate")]
    pub interest_rate: f64,
    /// Minimum premium as a fraction of the stock price.
    #[serde(default = "default_min_premium_ratio")]
    pub min_premium_ratio: f64,
}

fn default_put_strike_factor() -> f64 {
    0.95
}

fn default_call_strike_factor() -> f64 {
    1.05
}

fn default_days_to_expiration() -> i64 {
    30
}

fn default_min_premium_ratio() -> f64 {
    0.01
}

impl WheelConfig {
    pub fn new(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            put_strike_factor: default_put_strike_factor(),
            call_strike_factor: default_call_strike_factor(),
            days_to_expiration: default_days_to_expiration(),
            interest_rate: default_interest_rate(),
            min_premium_ratio: default_min_premium_ratio(),
        }
    }

    /// Closer strikes and shorter expiries.
    pub fn aggressive(ticker: &str) -> Self {
        Self {
            put_strike_factor: 0.98,
            call_strike_factor: 1.02,
            days_to_expiration: 14,
            min_premium_ratio: 0.005,
            ..Self::new(ticker)
        }
    }

    /// Further out-of-the-money strikes and longer expiries.
    pub fn conservative(ticker: &str) -> Self {
        Self {
            put_strike_factor: 0.90,
            call_strike_factor: 1.10,
            days_to_expiration: 45,
            min_premium_ratio: 0.015,
            ..Self::new(ticker)
        }
    }
}

#[derive(Debug, Clone)]
pub struct Wheel {
    config: WheelConfig,
    pricer: BlackScholes,
}

impl Wheel {
    pub fn new(config: WheelConfig) -> Self {
        let pricer = BlackScholes::new(config.interest_rate);
        Self { config, pricer }
    }

    /// Quote a premium and check it clears the minimum ratio.
    fn quote(&self, option_type: OptionType, price: f64, strike: Decimal, sigma: f64) -> Option<Decimal> {
        let premium = self.pricer.premium(
            option_type,
            price,
            to_f64(strike),
            sigma,
            self.config.days_to_expiration,
        );
        (premium / price >= self.config.min_premium_ratio).then(|| to_decimal(premium))
    }
}

impl Strategy for Wheel {
    fn name(&self) -> &str {
        "wheel"
    }

    fn on_day(&mut self, market: &MarketSnapshot<'_>, actions: &mut TradingActions<'_>) {
        let ticker = self.config.ticker.as_str();
        let Some(price) = market.price(ticker) else {
            return;
        };
        let Some(sigma) = market.latest_volatility(ticker) else {
            return;
        };

        let portfolio = actions.portfolio();
        let shares = portfolio.shares_held(ticker);
        let has_stock = shares > Decimal::ZERO;
        let has_short_put =
            portfolio.has_option(ticker, OptionType::Put, Some(OptionDirection::Short));
        let has_short_call =
            portfolio.has_option(ticker, OptionType::Call, Some(OptionDirection::Short));
        let cash = portfolio.cash();
        let expiration = market.date() + Duration::days(self.config.days_to_expiration);
        let spot = to_f64(price);

        if !has_stock && !has_short_put {
            let strike = price * to_decimal(self.config.put_strike_factor);
            let contracts = affordable_contracts(cash, strike);
            if contracts == 0 {
                return;
            }
            if let Some(premium) = self.quote(OptionType::Put, spot, strike, sigma) {
                actions.sell_put(ticker, strike, expiration, contracts, premium);
            }
        } else if has_stock && !has_short_call {
            let contracts = covered_contracts(shares);
            if contracts == 0 {
                return;
            }
            let strike = price * to_decimal(self.config.call_strike_factor);
            if let Some(premium) = self.quote(OptionType::Call, spot, strike, sigma) {
                actions.sell_call(ticker, strike, expiration, contracts, premium);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use crate::backtest::TransactionKind;
    use crate::data::{MarketData, VolatilitySeries};
    use crate::portfolio::{Portfolio, PriceMap};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    fn market(sigma: f64) -> MarketData {
        let vol: VolatilitySeries = vec![(day(1), sigma)].into_iter().collect();
        MarketData::from_parts(
            vec!["SPY".to_string()],
            HashMap::new(),
            HashMap::from([("SPY".to_string(), vol)]),
        )
    }

    fn run_day(strategy: &mut Wheel, market: &MarketData, portfolio: &mut Portfolio, log: &mut Vec<crate::backtest::Transaction>) {
        let prices = PriceMap::from([("SPY".to_string(), dec!(100))]);
        let snapshot = MarketSnapshot::new(day(2), &prices, market);
        let mut actions = TradingActions::new(day(2), portfolio, log);
        strategy.on_day(&snapshot, &mut actions);
    }

    #[test]
    fn test_sells_cash_secured_puts() {
        let market = market(0.4);
        let mut strategy = Wheel::new(WheelConfig::new("SPY"));
        let mut portfolio = Portfolio::new(dec!(20_000));
        let mut log = Vec::new();

        run_day(&mut strategy, &market, &mut portfolio, &mut log);

        assert_eq!(log.len(), 1);
        assert_eq!(log[0].kind, TransactionKind::SellPut);
        let put = &portfolio.options()[0];
        assert_eq!(put.strike, dec!(95));
        assert_eq!(put.contracts, 2);

        // phase 1 is gated on no open short put
        run_day(&mut strategy, &market, &mut portfolio, &mut log);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_sells_calls_when_holding_stock() {
        let market = market(0.4);
        let mut strategy = Wheel::new(WheelConfig::new("SPY"));
        let mut portfolio = Portfolio::new(dec!(20_000));
        let mut log = Vec::new();
        {
            let mut actions = TradingActions::new(day(1), &mut portfolio, &mut log);
            assert!(actions.buy_stock("SPY", dec!(100), dec!(100)));
        }

        run_day(&mut strategy, &market, &mut portfolio, &mut log);

        assert_eq!(log.last().map(|t| t.kind), Some(TransactionKind::SellCall));
        assert_eq!(portfolio.options()[0].strike, dec!(105));
    }

    #[test]
    fn test_thin_premium_skipped() {
        // at 5% vol a 5% OTM put over 30 days is nearly worthless
        let market = market(0.05);
        let mut strategy = Wheel::new(WheelConfig::new("SPY"));
        let mut portfolio = Portfolio::new(dec!(20_000));
        let mut log = Vec::new();

        run_day(&mut strategy, &market, &mut portfolio, &mut log);
        assert!(log.is_empty());
    }

    #[test]
    fn test_presets() {
        let aggressive = WheelConfig::aggressive("SPY");
        assert_eq!(aggressive.days_to_expiration, 14);
        assert_eq!(aggressive.min_premium_ratio, 0.005);
        let conservative = WheelConfig::conservative("SPY");
        assert_eq!(conservative.put_strike_factor, 0.90);
        assert_eq!(conservative.days_to_expiration, 45);
    }
}

//! LEAP strategy: long-dated calls instead of stock, rolled before expiry.

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::backtest::TradingActions;
use crate::data::OptionType;
use crate::portfolio::{OptionContract, OptionDirection};
use crate::pricing::BlackScholes;

use super::covered_call::default_interest_rate;
use super::{affordable_contracts, to_decimal, to_f64, MarketSnapshot, Strategy};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeapConfig {
    pub ticker: String,
    #[serde(default = "default_strike_factor")]
    pub strike_factor: f64,
    #[serde(default = "default_days_to_expiration")]
    pub days_to_expiration: i64,
    #[serde(default = "default_interest_rate")]
    pub interest_rate: f64,
    /// Roll once fewer than this many days remain.
    #[serde(default = "default_roll_threshold_days")]
    pub roll_threshold_days: i64,
    /// Cash required before opening a new position.
    #[serde(default = "default_min_cash")]
    pub min_cash: Decimal,
}

fn default_strike_factor() -> f64 {
    1.1
}

fn default_days_to_expiration() -> i64 {
    365
}

fn default_roll_threshold_days() -> i64 {
    90
}

fn default_min_cash() -> Decimal {
    Decimal::from(1000)
}

impl LeapConfig {
    pub fn new(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            strike_factor: default_strike_factor(),
            days_to_expiration: default_days_to_expiration(),
            interest_rate: default_interest_rate(),
            roll_threshold_days: default_roll_threshold_days(),
            min_cash: default_min_cash(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Leap {
    config: LeapConfig,
    pricer: BlackScholes,
}

impl Leap {
    pub fn new(config: LeapConfig) -> Self {
        let pricer = BlackScholes::new(config.interest_rate);
        Self { config, pricer }
    }

    /// Buy as many new LEAPs as cash allows. Skips a non-positive premium.
    fn open(&self, market: &MarketSnapshot<'_>, actions: &mut TradingActions<'_>, price: Decimal, sigma: f64) {
        let ticker = self.config.ticker.as_str();
        let strike = price * to_decimal(self.config.strike_factor);
        let premium = to_decimal(self.pricer.premium(
            OptionType::Call,
            to_f64(price),
            to_f64(strike),
            sigma,
            self.config.days_to_expiration,
        ));
        if premium <= Decimal::ZERO {
            return;
        }

        let contracts = affordable_contracts(actions.portfolio().cash(), premium);
        if contracts > 0 {
            let expiration = market.date() + Duration::days(self.config.days_to_expiration);
            actions.buy_call(ticker, strike, expiration, contracts, premium);
        }
    }

    /// First long call on the ticker inside the roll window.
    fn roll_candidate(&self, actions: &TradingActions<'_>) -> Option<OptionContract> {
        let date = actions.date();
        actions
            .portfolio()
            .options_for(&self.config.ticker, OptionType::Call, Some(OptionDirection::Long))
            .find(|o| {
                let dte = o.days_to_expiration(date);
                dte > 0 && dte < self.config.roll_threshold_days
            })
            .cloned()
    }
}

impl Strategy for Leap {
    fn name(&self) -> &str {
        "leap"
    }

    fn on_day(&mut self, market: &MarketSnapshot<'_>, actions: &mut TradingActions<'_>) {
        let ticker = self.config.ticker.as_str();
        let Some(price) = market.price(ticker) else {
            return;
        };
        let sigma = market.latest_volatility(ticker);

        let has_leap = actions
            .portfolio()
            .has_option(ticker, OptionType::Call, Some(OptionDirection::Long));
        if !has_leap && actions.portfolio().cash() > self.config.min_cash {
            if let Some(sigma) = sigma {
                self.open(market, actions, price, sigma);
            }
        }

        // At most one roll per day
        let Some(expiring) = self.roll_candidate(actions) else {
            return;
        };
        let Some(sigma) = sigma else {
            return;
        };

        let dte = expiring.days_to_expiration(market.date());
        let value = self.pricer.call_price(
            to_f64(price),
            to_f64(expiring.strike),
            sigma,
            dte as f64 / 365.0,
        );
        actions.close_call(
            ticker,
            expiring.strike,
            expiring.expiration,
            expiring.contracts,
            to_decimal(value),
        );
        self.open(market, actions, price, sigma);
    }
}

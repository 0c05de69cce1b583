//! Mark-to-market valuation of a portfolio.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::{intrinsic_value, price};

use super::position::{OptionContract, OptionDirection};
use super::state::Portfolio;

/// Current close per ticker.
pub type PriceMap = HashMap<String, Decimal>;

const DAYS_PER_YEAR: f64 = 365.0;

/// Valuation components for one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationBreakdown {
    pub cash: Decimal,
    pub stock_value: Decimal,
    /// Net option value: longs add, shorts subtract.
    pub options_value: Decimal,
    pub total_value: Decimal,
}

fn to_f64(value: Decimal) -> f64 {
    value.try_into().unwrap_or(0.0)
}

impl Portfolio {
    /// Sum of `shares × price` over held positions. Missing prices count as 0.
    pub fn stock_value(&self, prices: &PriceMap) -> Decimal {
        self.positions()
            .map(|p| {
                let price = prices.get(&p.ticker).copied().unwrap_or(Decimal::ZERO);
                p.market_value(price)
            })
            .sum()
    }

    /// Signed value of one contract on `date`, including the 100-share
    /// multiplier. Expired contracts are worth 0.
    pub fn option_value(
        contract: &OptionContract,
        date: NaiveDate,
        prices: &PriceMap,
        volatility: Option<f64>,
        rate: f64,
    ) -> Decimal {
        if contract.is_expired(date) {
            return Decimal::ZERO;
        }

        let spot = to_f64(prices.get(&contract.ticker).copied().unwrap_or(Decimal::ZERO));
        let strike = to_f64(contract.strike);
        let time = contract.days_to_expiration(date) as f64 / DAYS_PER_YEAR;

        let per_share = match volatility {
            Some(sigma) if sigma.is_finite() && sigma > 0.0 && time > 0.0 => {
                price(contract.option_type, spot, strike, sigma, rate, time)
            }
            _ => intrinsic_value(contract.option_type, spot, strike),
        };

        let value = Decimal::try_from(per_share).unwrap_or(Decimal::ZERO) * contract.notional_shares();
        match contract.direction {
            OptionDirection::Long => value,
            OptionDirection::Short => -value,
        }
    }

    /// Net value of all open option contracts.
    pub fn options_value(
        &self,
        date: NaiveDate,
        prices: &PriceMap,
        volatility: Option<f64>,
        rate: f64,
    ) -> Decimal {
        self.options()
            .iter()
            .map(|c| Self::option_value(c, date, prices, volatility, rate))
            .sum()
    }

    /// Cash plus stock plus net option value.
    pub fn total_value(
        &self,
        date: NaiveDate,
        prices: &PriceMap,
        volatility: Option<f64>,
        rate: f64,
    ) -> Decimal {
        self.valuation(date, prices, volatility, rate).total_value
    }

    pub fn valuation(
        &self,
        date: NaiveDate,
        prices: &PriceMap,
        volatility: Option<f64>,
        rate: f64,
    ) -> ValuationBreakdown {
        let cash = self.cash();
        let stock_value = self.stock_value(prices);
        let options_value = self.options_value(date, prices, volatility, rate);
        ValuationBreakdown {
            cash,
            stock_value,
            options_value,
            total_value: cash + stock_value + options_value,
        }
    }
}

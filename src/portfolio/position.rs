//! Stock positions and option contracts held by a portfolio.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::data::OptionType;

/// Underlying shares per option contract.
pub const SHARES_PER_CONTRACT: u32 = 100;

/// Notional shares for a contract count.
pub fn contract_shares(contracts: u32) -> Decimal {
    Decimal::from(contracts) * Decimal::from(SHARES_PER_CONTRACT)
}

/// Direction of an option position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionDirection {
    /// Premium paid, holder of the right.
    Long,
    /// Premium received, writer of the obligation.
    Short,
}

/// Stock holding in one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    /// Share count. Only forced assignment can drive this below zero.
    pub shares: Decimal,
    /// Weighted-average cost per share.
    pub avg_cost: Decimal,
}

impl Position {
    pub fn new(ticker: &str, shares: Decimal, avg_cost: Decimal) -> Self {
        Self {
            ticker: ticker.to_string(),
            shares,
            avg_cost,
        }
    }

    /// Add shares bought for `cost` in total, re-weighting the cost basis.
    pub(crate) fn add_shares(&mut self, shares: Decimal, cost: Decimal) {
        let total = self.shares + shares;
        if total.is_zero() {
            self.shares = Decimal::ZERO;
            return;
        }
        self.avg_cost = (self.avg_cost * self.shares + cost) / total;
        self.shares = total;
    }

    pub fn market_value(&self, price: Decimal) -> Decimal {
        self.shares * price
    }

    pub fn unrealized_pnl(&self, price: Decimal) -> Decimal {
        (price - self.avg_cost) * self.shares
    }
}

/// An open option position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    pub ticker: String,
    pub strike: Decimal,
    pub expiration: NaiveDate,
    pub option_type: OptionType,
    pub direction: OptionDirection,
    /// Number of contracts, 100 shares each.
    pub contracts: u32,
    /// Total premium at open: positive when received (short), negative when
    /// paid (long).
    pub premium_received: Decimal,
}

impl OptionContract {
    pub fn is_short(&self) -> bool {
        self.direction == OptionDirection::Short
    }

    pub fn is_long(&self) -> bool {
        self.direction == OptionDirection::Long
    }

    /// Expired on or before `date`.
    pub fn is_expired(&self, date: NaiveDate) -> bool {
        self.expiration <= date
    }

    /// Calendar days left until expiration (negative once past).
    pub fn days_to_expiration(&self, date: NaiveDate) -> i64 {
        (self.expiration - date).num_days()
    }

    pub fn notional_shares(&self) -> Decimal {
        contract_shares(self.contracts)
    }

    /// Whether this contract matches the identity used to close it.
    pub fn matches(
        &self,
        ticker: &str,
        option_type: OptionType,
        direction: OptionDirection,
        strike: Decimal,
        expiration: NaiveDate,
    ) -> bool {
        self.ticker == ticker
            && self.option_type == option_type
            && self.direction == direction
            && self.strike == strike
            && self.expiration == expiration
    }
}

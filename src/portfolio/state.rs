//! Portfolio state: cash, stock positions and open option contracts.
//!
//! Reads are public. Every mutation is crate-private and reached only
//! through the trading-action executor, which owns the balance and coverage
//! rules and writes the transaction log.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::data::OptionType;

use super::position::{OptionContract, OptionDirection, Position};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    cash: Decimal,
    positions: BTreeMap<String, Position>,
    options: Vec<OptionContract>,
}

impl Portfolio {
    pub fn new(cash: Decimal) -> Self {
        Self {
            cash,
            positions: BTreeMap::new(),
            options: Vec::new(),
        }
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn position(&self, ticker: &str) -> Option<&Position> {
        self.positions.get(ticker)
    }

    /// Shares held in `ticker`, zero when there is no position.
    pub fn shares_held(&self, ticker: &str) -> Decimal {
        self.positions
            .get(ticker)
            .map(|p| p.shares)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn options(&self) -> &[OptionContract] {
        &self.options
    }

    /// Open contracts on `ticker` of the given type, optionally filtered by
    /// direction.
    pub fn options_for<'a>(
        &'a self,
        ticker: &'a str,
        option_type: OptionType,
        direction: Option<OptionDirection>,
    ) -> impl Iterator<Item = &'a OptionContract> + 'a {
        self.options.iter().filter(move |o| {
            o.ticker == ticker
                && o.option_type == option_type
                && direction.map_or(true, |d| o.direction == d)
        })
    }

    pub fn has_option(
        &self,
        ticker: &str,
        option_type: OptionType,
        direction: Option<OptionDirection>,
    ) -> bool {
        self.options_for(ticker, option_type, direction).next().is_some()
    }

    pub(crate) fn credit(&mut self, amount: Decimal) {
        self.cash += amount;
    }

    pub(crate) fn debit(&mut self, amount: Decimal) {
        self.cash -= amount;
    }

    /// Add bought shares at a total `cost`.
    pub(crate) fn add_shares(&mut self, ticker: &str, shares: Decimal, cost: Decimal) {
        match self.positions.get_mut(ticker) {
            Some(position) => position.add_shares(shares, cost),
            None => {
                let avg_cost = if shares.is_zero() { Decimal::ZERO } else { cost / shares };
                self.positions
                    .insert(ticker.to_string(), Position::new(ticker, shares, avg_cost));
            }
        }
        self.drop_if_flat(ticker);
    }

    /// Remove sold shares. A ticker with no position goes short at `price`.
    pub(crate) fn remove_shares(&mut self, ticker: &str, shares: Decimal, price: Decimal) {
        self.positions
            .entry(ticker.to_string())
            .and_modify(|p| p.shares -= shares)
            .or_insert_with(|| Position::new(ticker, -shares, price));
        self.drop_if_flat(ticker);
    }

    fn drop_if_flat(&mut self, ticker: &str) {
        if self.positions.get(ticker).is_some_and(|p| p.shares.is_zero()) {
            self.positions.remove(ticker);
        }
    }

    pub(crate) fn push_option(&mut self, contract: OptionContract) {
        self.options.push(contract);
    }

    /// Index of the first contract matching the identity with at least
    /// `contracts` remaining.
    pub(crate) fn find_option(
        &self,
        ticker: &str,
        option_type: OptionType,
        direction: OptionDirection,
        strike: Decimal,
        expiration: NaiveDate,
        contracts: u32,
    ) -> Option<usize> {
        self.options.iter().position(|o| {
            o.matches(ticker, option_type, direction, strike, expiration)
                && o.contracts >= contracts
        })
    }

    /// Reduce a contract's count, removing it at zero.
    pub(crate) fn reduce_option(&mut self, index: usize, contracts: u32) {
        let Some(contract) = self.options.get_mut(index) else {
            return;
        };
        contract.contracts = contract.contracts.saturating_sub(contracts);
        if contract.contracts == 0 {
            self.options.remove(index);
        }
    }

    /// Remove and return every contract expiring on or before `date`, in
    /// their original order.
    pub(crate) fn take_expired(&mut self, date: NaiveDate) -> Vec<OptionContract> {
        let (expired, open): (Vec<_>, Vec<_>) = std::mem::take(&mut self.options)
            .into_iter()
            .partition(|o| o.is_expired(date));
        self.options = open;
        expired
    }
}

//! Trading action executor.
//!
//! `TradingActions` is the per-day execution context handed to a strategy.
//! It is the only code path that mutates a [`Portfolio`], and every
//! successful action appends exactly one [`Transaction`] stamped with the
//! context's date. Failed actions (insufficient cash, shares, or no matching
//! contract) return `false` and leave everything untouched.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::data::OptionType;
use crate::portfolio::{contract_shares, OptionContract, OptionDirection, Portfolio};

use super::transaction::{Transaction, TransactionKind};

pub struct TradingActions<'a> {
    date: NaiveDate,
    portfolio: &'a mut Portfolio,
    log: &'a mut Vec<Transaction>,
}

impl<'a> TradingActions<'a> {
    pub fn new(date: NaiveDate, portfolio: &'a mut Portfolio, log: &'a mut Vec<Transaction>) -> Self {
        Self {
            date,
            portfolio,
            log,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn portfolio(&self) -> &Portfolio {
        self.portfolio
    }

    fn reject(&self, action: &str, ticker: &str, reason: &str) -> bool {
        debug!(date = %self.date, action, ticker, reason, "action rejected");
        false
    }

    fn record(&mut self, tx: Transaction) {
        self.log.push(tx);
    }

    /// Buy `shares` at `price`. Fails when the cost exceeds cash.
    pub fn buy_stock(&mut self, ticker: &str, shares: Decimal, price: Decimal) -> bool {
        if shares <= Decimal::ZERO || price <= Decimal::ZERO {
            return self.reject("buy_stock", ticker, "non-positive input");
        }
        let cost = shares * price;
        if cost > self.portfolio.cash() {
            return self.reject("buy_stock", ticker, "insufficient cash");
        }

        self.portfolio.debit(cost);
        self.portfolio.add_shares(ticker, shares, cost);
        self.record(Transaction::stock(
            self.date,
            TransactionKind::BuyStock,
            ticker,
            shares,
            price,
            -cost,
        ));
        true
    }

    /// Sell `shares` at `price`. Fails without a position holding enough
    /// shares.
    pub fn sell_stock(&mut self, ticker: &str, shares: Decimal, price: Decimal) -> bool {
        if shares <= Decimal::ZERO || price <= Decimal::ZERO {
            return self.reject("sell_stock", ticker, "non-positive input");
        }
        let held = match self.portfolio.position(ticker) {
            Some(position) => position.shares,
            None => return self.reject("sell_stock", ticker, "no position"),
        };
        if held < shares {
            return self.reject("sell_stock", ticker, "insufficient shares");
        }

        self.execute_sell(ticker, shares, price);
        true
    }

    /// Assignment sale: no position or share check. May leave a negative
    /// share count.
    pub fn force_sell_stock(&mut self, ticker: &str, shares: Decimal, price: Decimal) {
        self.execute_sell(ticker, shares, price);
        let held = self.portfolio.shares_held(ticker);
        if held < Decimal::ZERO {
            warn!(date = %self.date, ticker, shares = %held, "forced sale left a short stock position");
        }
    }

    /// Assignment purchase: no cash check. May leave negative cash.
    pub fn force_buy_stock(&mut self, ticker: &str, shares: Decimal, price: Decimal) {
        let cost = shares * price;
        self.portfolio.debit(cost);
        self.portfolio.add_shares(ticker, shares, cost);
        self.record(Transaction::stock(
            self.date,
            TransactionKind::BuyStock,
            ticker,
            shares,
            price,
            -cost,
        ));
        if self.portfolio.cash() < Decimal::ZERO {
            warn!(date = %self.date, ticker, cash = %self.portfolio.cash(), "forced purchase left negative cash");
        }
    }

    fn execute_sell(&mut self, ticker: &str, shares: Decimal, price: Decimal) {
        let proceeds = shares * price;
        self.portfolio.credit(proceeds);
        self.portfolio.remove_shares(ticker, shares, price);
        self.record(Transaction::stock(
            self.date,
            TransactionKind::SellStock,
            ticker,
            shares,
            price,
            proceeds,
        ));
    }

    /// Write covered calls. Requires `contracts × 100` shares held.
    pub fn sell_call(
        &mut self,
        ticker: &str,
        strike: Decimal,
        expiration: NaiveDate,
        contracts: u32,
        premium: Decimal,
    ) -> bool {
        if !self.valid_option_inputs(ticker, "sell_call", strike, contracts, premium) {
            return false;
        }
        if self.portfolio.shares_held(ticker) < contract_shares(contracts) {
            return self.reject("sell_call", ticker, "not enough shares to cover");
        }
        self.open_short(ticker, OptionType::Call, strike, expiration, contracts, premium);
        true
    }

    /// Write puts. Cash securing is left to the caller.
    pub fn sell_put(
        &mut self,
        ticker: &str,
        strike: Decimal,
        expiration: NaiveDate,
        contracts: u32,
        premium: Decimal,
    ) -> bool {
        if !self.valid_option_inputs(ticker, "sell_put", strike, contracts, premium) {
            return false;
        }
        self.open_short(ticker, OptionType::Put, strike, expiration, contracts, premium);
        true
    }

    pub fn buy_call(
        &mut self,
        ticker: &str,
        strike: Decimal,
        expiration: NaiveDate,
        contracts: u32,
        premium: Decimal,
    ) -> bool {
        self.open_long(ticker, OptionType::Call, strike, expiration, contracts, premium)
    }

    pub fn buy_put(
        &mut self,
        ticker: &str,
        strike: Decimal,
        expiration: NaiveDate,
        contracts: u32,
        premium: Decimal,
    ) -> bool {
        self.open_long(ticker, OptionType::Put, strike, expiration, contracts, premium)
    }

    /// Sell back long calls matching `(ticker, strike, expiration)`.
    pub fn close_call(
        &mut self,
        ticker: &str,
        strike: Decimal,
        expiration: NaiveDate,
        contracts: u32,
        premium: Decimal,
    ) -> bool {
        self.close_long(ticker, OptionType::Call, strike, expiration, contracts, premium)
    }

    /// Sell back long puts matching `(ticker, strike, expiration)`.
    pub fn close_put(
        &mut self,
        ticker: &str,
        strike: Decimal,
        expiration: NaiveDate,
        contracts: u32,
        premium: Decimal,
    ) -> bool {
        self.close_long(ticker, OptionType::Put, strike, expiration, contracts, premium)
    }

    fn valid_option_inputs(
        &self,
        ticker: &str,
        action: &str,
        strike: Decimal,
        contracts: u32,
        premium: Decimal,
    ) -> bool {
        if contracts == 0 || strike <= Decimal::ZERO || premium < Decimal::ZERO {
            return self.reject(action, ticker, "invalid option inputs");
        }
        true
    }

    fn open_short(
        &mut self,
        ticker: &str,
        option_type: OptionType,
        strike: Decimal,
        expiration: NaiveDate,
        contracts: u32,
        premium: Decimal,
    ) {
        let credit = premium * contract_shares(contracts);
        self.portfolio.credit(credit);
        self.portfolio.push_option(OptionContract {
            ticker: ticker.to_string(),
            strike,
            expiration,
            option_type,
            direction: OptionDirection::Short,
            contracts,
            premium_received: credit,
        });

        let kind = match option_type {
            OptionType::Call => TransactionKind::SellCall,
            OptionType::Put => TransactionKind::SellPut,
        };
        self.record(Transaction::option(
            self.date, kind, ticker, contracts, premium, strike, expiration, credit,
        ));
    }

    fn open_long(
        &mut self,
        ticker: &str,
        option_type: OptionType,
        strike: Decimal,
        expiration: NaiveDate,
        contracts: u32,
        premium: Decimal,
    ) -> bool {
        let action = match option_type {
            OptionType::Call => "buy_call",
            OptionType::Put => "buy_put",
        };
        if !self.valid_option_inputs(ticker, action, strike, contracts, premium) {
            return false;
        }
        let cost = premium * contract_shares(contracts);
        if cost > self.portfolio.cash() {
            return self.reject(action, ticker, "insufficient cash");
        }

        self.portfolio.debit(cost);
        self.portfolio.push_option(OptionContract {
            ticker: ticker.to_string(),
            strike,
            expiration,
            option_type,
            direction: OptionDirection::Long,
            contracts,
            premium_received: -cost,
        });

        let kind = match option_type {
            OptionType::Call => TransactionKind::BuyCall,
            OptionType::Put => TransactionKind::BuyPut,
        };
        self.record(Transaction::option(
            self.date, kind, ticker, contracts, premium, strike, expiration, -cost,
        ));
        true
    }

    fn close_long(
        &mut self,
        ticker: &str,
        option_type: OptionType,
        strike: Decimal,
        expiration: NaiveDate,
        contracts: u32,
        premium: Decimal,
    ) -> bool {
        let action = match option_type {
            OptionType::Call => "close_call",
            OptionType::Put => "close_put",
        };
        if !self.valid_option_inputs(ticker, action, strike, contracts, premium) {
            return false;
        }
        let Some(index) = self.portfolio.find_option(
            ticker,
            option_type,
            OptionDirection::Long,
            strike,
            expiration,
            contracts,
        ) else {
            return self.reject(action, ticker, "no matching long contract");
        };

        let proceeds = premium * contract_shares(contracts);
        self.portfolio.credit(proceeds);
        self.portfolio.reduce_option(index, contracts);

        let kind = match option_type {
            OptionType::Call => TransactionKind::CloseCall,
            OptionType::Put => TransactionKind::ClosePut,
        };
        self.record(Transaction::option(
            self.date, kind, ticker, contracts, premium, strike, expiration, proceeds,
        ));
        true
    }

    /// Remove every contract expiring on or before today.
    pub(crate) fn take_expired(&mut self) -> Vec<OptionContract> {
        self.portfolio.take_expired(self.date)
    }

    /// Append an exercise marker. Used by expiration handling ahead of the
    /// forced stock trade.
    pub(crate) fn record_exercise(&mut self, contract: &OptionContract, underlying_price: Decimal) {
        let kind = match contract.option_type {
            OptionType::Call => TransactionKind::CallExercised,
            OptionType::Put => TransactionKind::PutExercised,
        };
        self.record(Transaction::exercise(
            self.date,
            kind,
            &contract.ticker,
            contract.contracts,
            contract.strike,
            contract.expiration,
            underlying_price,
        ));
    }
}

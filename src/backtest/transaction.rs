//! Append-only transaction ledger entries.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    BuyStock,
    SellStock,
    BuyCall,
    SellCall,
    BuyPut,
    SellPut,
    CloseCall,
    ClosePut,
    /// A short call was assigned at expiration.
    CallExercised,
    /// A short put was assigned at expiration.
    PutExercised,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::BuyStock => "BUY_STOCK",
            TransactionKind::SellStock => "SELL_STOCK",
            TransactionKind::BuyCall => "BUY_CALL",
            TransactionKind::SellCall => "SELL_CALL",
            TransactionKind::BuyPut => "BUY_PUT",
            TransactionKind::SellPut => "SELL_PUT",
            TransactionKind::CloseCall => "CLOSE_CALL",
            TransactionKind::ClosePut => "CLOSE_PUT",
            TransactionKind::CallExercised => "CALL_EXERCISED",
            TransactionKind::PutExercised => "PUT_EXERCISED",
        }
    }

    pub fn is_exercise(&self) -> bool {
        matches!(
            self,
            TransactionKind::CallExercised | TransactionKind::PutExercised
        )
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One executed action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub ticker: String,
    /// Shares for stock entries, contracts for option entries.
    pub quantity: Decimal,
    /// Per-share trade price or option premium.
    pub price: Decimal,
    /// Option strike.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strike: Option<Decimal>,
    /// Option expiration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<NaiveDate>,
    /// Underlying close at exercise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underlying_price: Option<Decimal>,
    /// Signed change in cash caused by this entry.
    pub cash_delta: Decimal,
}

impl Transaction {
    pub fn stock(
        date: NaiveDate,
        kind: TransactionKind,
        ticker: &str,
        shares: Decimal,
        price: Decimal,
        cash_delta: Decimal,
    ) -> Self {
        Self {
            date,
            kind,
            ticker: ticker.to_string(),
            quantity: shares,
            price,
            strike: None,
            expiration: None,
            underlying_price: None,
            cash_delta,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn option(
        date: NaiveDate,
        kind: TransactionKind,
        ticker: &str,
        contracts: u32,
        premium: Decimal,
        strike: Decimal,
        expiration: NaiveDate,
        cash_delta: Decimal,
    ) -> Self {
        Self {
            date,
            kind,
            ticker: ticker.to_string(),
            quantity: Decimal::from(contracts),
            price: premium,
            strike: Some(strike),
            expiration: Some(expiration),
            underlying_price: None,
            cash_delta,
        }
    }

    /// Exercise marker. Cash moves on the paired stock entry.
    pub fn exercise(
        date: NaiveDate,
        kind: TransactionKind,
        ticker: &str,
        contracts: u32,
        strike: Decimal,
        expiration: NaiveDate,
        underlying_price: Decimal,
    ) -> Self {
        Self {
            date,
            kind,
            ticker: ticker.to_string(),
            quantity: Decimal::from(contracts),
            price: strike,
            strike: Some(strike),
            expiration: Some(expiration),
            underlying_price: Some(underlying_price),
            cash_delta: Decimal::ZERO,
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:<14} {:<6} qty {:>8} @ {:>10.2}",
            self.date, self.kind, self.ticker, self.quantity, self.price
        )?;
        if let (Some(strike), Some(expiration)) = (self.strike, self.expiration) {
            write!(f, " K {:.2} exp {}", strike, expiration)?;
        }
        write!(f, " cash {:+.2}", self.cash_delta)
    }
}

//! Point-in-time view of market data handed to a strategy.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::data::{closes_as_f64, DailyPoint, MarketData};
use crate::portfolio::PriceMap;

/// Market data visible on one simulated day.
///
/// History is truncated to dates on or before `date`, so a strategy cannot
/// look ahead.
#[derive(Debug, Clone, Copy)]
pub struct MarketSnapshot<'a> {
    date: NaiveDate,
    prices: &'a PriceMap,
    market: &'a MarketData,
}

impl<'a> MarketSnapshot<'a> {
    pub fn new(date: NaiveDate, prices: &'a PriceMap, market: &'a MarketData) -> Self {
        Self {
            date,
            prices,
            market,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn prices(&self) -> &'a PriceMap {
        self.prices
    }

    /// Resolved close for `ticker`, `None` when unknown or not positive.
    pub fn price(&self, ticker: &str) -> Option<Decimal> {
        self.prices
            .get(ticker)
            .copied()
            .filter(|p| *p > Decimal::ZERO)
    }

    /// Close history up to and including the snapshot date.
    pub fn closes(&self, ticker: &str) -> &'a [DailyPoint<Decimal>] {
        self.market
            .closes(ticker)
            .map(|s| s.up_to(self.date))
            .unwrap_or(&[])
    }

    pub fn close_values(&self, ticker: &str) -> Vec<f64> {
        closes_as_f64(self.closes(ticker))
    }

    /// Volatility history up to and including the snapshot date.
    pub fn volatility(&self, ticker: &str) -> &'a [DailyPoint<f64>] {
        self.market
            .volatility(ticker)
            .map(|s| s.up_to(self.date))
            .unwrap_or(&[])
    }

    /// Most recent volatility observation, if usable.
    pub fn latest_volatility(&self, ticker: &str) -> Option<f64> {
        self.volatility(ticker)
            .last()
            .map(|p| p.value)
            .filter(|v| v.is_finite())
    }
}

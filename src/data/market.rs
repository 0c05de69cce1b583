//! Preloaded market data for one backtest window.
//!
//! Loaded once, then read-only for the run. Parameter sweeps share a single
//! instance behind an `Arc`.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::calendar::CalendarReport;
use super::source::{DataError, MarketDataSource, VolatilitySource};
use super::types::{PriceSeries, VolatilitySeries};

#[derive(Debug, Clone)]
pub struct MarketData {
    tickers: Vec<String>,
    calendar: Vec<NaiveDate>,
    closes: HashMap<String, PriceSeries>,
    volatility: HashMap<String, VolatilitySeries>,
}

impl MarketData {
    /// Load closes and volatility for every ticker over `[start, end]`.
    ///
    /// The trading calendar is the first ticker's close dates.
    pub fn load(
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
        prices: &dyn MarketDataSource,
        volatility: &dyn VolatilitySource,
    ) -> Result<Self, DataError> {
        if tickers.is_empty() {
            return Err(DataError::InvalidData("no tickers requested".to_string()));
        }

        let mut closes = HashMap::with_capacity(tickers.len());
        let mut vols = HashMap::with_capacity(tickers.len());
        for ticker in tickers {
            closes.insert(ticker.clone(), prices.daily_closes(ticker, start, end)?);
            vols.insert(ticker.clone(), volatility.volatility(ticker, start, end)?);
        }

        Ok(Self::from_parts(tickers.to_vec(), closes, vols))
    }

    /// Assemble from already-sliced series.
    pub fn from_parts(
        tickers: Vec<String>,
        closes: HashMap<String, PriceSeries>,
        volatility: HashMap<String, VolatilitySeries>,
    ) -> Self {
        let calendar = tickers
            .first()
            .and_then(|t| closes.get(t))
            .map(|s| s.dates().collect())
            .unwrap_or_default();

        Self {
            tickers,
            calendar,
            closes,
            volatility,
        }
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn primary_ticker(&self) -> Option<&str> {
        self.tickers.first().map(String::as_str)
    }

    pub fn calendar(&self) -> &[NaiveDate] {
        &self.calendar
    }

    pub fn closes(&self, ticker: &str) -> Option<&PriceSeries> {
        self.closes.get(ticker)
    }

    pub fn volatility(&self, ticker: &str) -> Option<&VolatilitySeries> {
        self.volatility.get(ticker)
    }

    /// Close on `date`, falling back to the most recent prior close.
    pub fn close_on(&self, ticker: &str, date: NaiveDate) -> Option<Decimal> {
        let series = self.closes.get(ticker)?;
        series
            .get(date)
            .copied()
            .or_else(|| series.last_on_or_before(date).map(|p| p.value))
    }

    /// Compare every secondary ticker against the primary calendar.
    pub fn calendar_report(&self) -> CalendarReport {
        let secondary = self.tickers.iter().skip(1).map(|t| {
            let dates = self
                .closes
                .get(t)
                .map(|s| s.dates().collect())
                .unwrap_or_default();
            (t.as_str(), dates)
        });
        CalendarReport::compare(&self.calendar, secondary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemoryMarketData;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    fn source() -> InMemoryMarketData {
        InMemoryMarketData::new()
            .with_closes(
                "AAA",
                vec![(day(1), dec!(10)), (day(2), dec!(11)), (day(3), dec!(12))]
                    .into_iter()
                    .collect(),
            )
            .with_closes(
                "BBB",
                vec![(day(1), dec!(50)), (day(3), dec!(52))].into_iter().collect(),
            )
    }

    #[test]
    fn test_calendar_from_first_ticker() {
        let data = source();
        let tickers = vec!["AAA".to_string(), "BBB".to_string()];
        let market = MarketData::load(&tickers, day(1), day(3), &data, &data).unwrap();

        assert_eq!(market.calendar(), &[day(1), day(2), day(3)]);
        assert_eq!(market.primary_ticker(), Some("AAA"));
    }

    #[test]
    fn test_close_carries_forward() {
        let data = source();
        let tickers = vec!["AAA".to_string(), "BBB".to_string()];
        let market = MarketData::load(&tickers, day(1), day(3), &data, &data).unwrap();

        assert_eq!(market.close_on("BBB", day(2)), Some(dec!(50)));
        assert_eq!(market.close_on("BBB", day(3)), Some(dec!(52)));
        assert_eq!(market.close_on("ZZZ", day(3)), None);
    }

    #[test]
    fn test_calendar_report_flags_gap() {
        let data = source();
        let tickers = vec!["AAA".to_string(), "BBB".to_string()];
        let market = MarketData::load(&tickers, day(1), day(3), &data, &data).unwrap();

        let report = market.calendar_report();
        assert!(!report.is_consistent());
        assert_eq!(report.mismatches[0].missing, vec![day(2)]);
    }

    #[test]
    fn test_empty_tickers_rejected() {
        let data = source();
        assert!(MarketData::load(&[], day(1), day(3), &data, &data).is_err());
    }
}

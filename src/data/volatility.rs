//! Historical (realized) volatility derived from closing prices.
//!
//! Log returns of consecutive closes, rolling sample standard deviation over
//! `window` returns, annualized by sqrt(252). A point is emitted only once its
//! window is complete and every return in it is finite.

use chrono::{Duration, NaiveDate};

use super::source::{DataError, MarketDataSource, VolatilitySource};
use super::types::{DailyPoint, PriceSeries, VolatilitySeries};

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Default rolling window, in returns.
pub const DEFAULT_VOLATILITY_WINDOW: usize = 30;

/// Rolling annualized volatility of a close series.
pub fn historical_volatility(closes: &PriceSeries, window: usize) -> VolatilitySeries {
    let points = closes.points();
    if window < 2 || points.len() <= window {
        return VolatilitySeries::default();
    }

    let log_returns: Vec<f64> = points
        .windows(2)
        .map(|w| {
            let prev: f64 = w[0].value.try_into().unwrap_or(0.0);
            let curr: f64 = w[1].value.try_into().unwrap_or(0.0);
            if prev > 0.0 && curr > 0.0 {
                (curr / prev).ln()
            } else {
                f64::NAN
            }
        })
        .collect();

    let annualize = TRADING_DAYS_PER_YEAR.sqrt();
    let mut out = Vec::with_capacity(log_returns.len() + 1 - window);

    // log_returns[i] is the return into points[i + 1]
    for end in window..=log_returns.len() {
        let slice = &log_returns[end - window..end];
        if slice.iter().any(|r| !r.is_finite()) {
            continue;
        }
        let n = slice.len() as f64;
        let mean = slice.iter().sum::<f64>() / n;
        let variance = slice.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
        out.push(DailyPoint::new(points[end].date, variance.sqrt() * annualize));
    }

    VolatilitySeries::from_points(out)
}

/// Volatility source computed from any close-price source.
pub struct HistoricalVolatility<'a> {
    source: &'a dyn MarketDataSource,
    window: usize,
}

impl<'a> HistoricalVolatility<'a> {
    pub fn new(source: &'a dyn MarketDataSource, window: usize) -> Self {
        Self { source, window }
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl VolatilitySource for HistoricalVolatility<'_> {
    /// Loads a warm-up range of `2 * window` calendar days before `start` so
    /// the series is populated from the first requested day.
    fn volatility(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<VolatilitySeries, DataError> {
        let warmup_start = start - Duration::days(self.window as i64 * 2);
        let closes = self.source.daily_closes(ticker, warmup_start, end)?;
        Ok(historical_volatility(&closes, self.window).between(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemoryMarketData;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn closes(values: &[Decimal]) -> PriceSeries {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (base + Duration::days(i as i64), *v))
            .collect()
    }

    #[test]
    fn test_alternating_returns() {
        let series = closes(&[dec!(100), dec!(110), dec!(100), dec!(110)]);
        let vol = historical_volatility(&series, 2);

        // First full window ends at the third close
        assert_eq!(vol.len(), 2);
        let a = (1.1_f64).ln();
        let expected = a * 2.0_f64.sqrt() * 252.0_f64.sqrt();
        assert!((vol.points()[0].value - expected).abs() < 1e-9);
        assert_eq!(vol.points()[0].date, series.points()[2].date);
    }

    #[test]
    fn test_constant_growth_has_zero_volatility() {
        let values: Vec<Decimal> = (0..10).map(|i| dec!(100) * Decimal::from(2_i64.pow(i))).collect();
        let vol = historical_volatility(&closes(&values), 3);
        assert!(!vol.is_empty());
        assert!(vol.points().iter().all(|p| p.value.abs() < 1e-12));
    }

    #[test]
    fn test_short_series_is_empty() {
        let vol = historical_volatility(&closes(&[dec!(1), dec!(2), dec!(3)]), 3);
        assert!(vol.is_empty());
    }

    #[test]
    fn test_zero_price_breaks_window() {
        let series = closes(&[dec!(100), dec!(0), dec!(100), dec!(101), dec!(102), dec!(103)]);
        let vol = historical_volatility(&series, 2);
        // Returns into day 1 and day 2 are invalid; first clean window ends at day 4
        assert_eq!(vol.first().map(|p| p.date), Some(series.points()[4].date));
    }

    #[test]
    fn test_source_uses_warmup() {
        let series = closes(&(0..40).map(|i| dec!(100) + Decimal::from(i % 3)).collect::<Vec<_>>());
        let start = series.points()[10].date;
        let end = series.points()[39].date;
        let data = InMemoryMarketData::new().with_closes("SPY", series);

        let source = HistoricalVolatility::new(&data, 5);
        let vol = source.volatility("SPY", start, end).unwrap();
        assert_eq!(vol.first().map(|p| p.date), Some(start));
        assert_eq!(vol.len(), 30);
    }
}

//! Trading calendar consistency checks.
//!
//! A multi-ticker run walks the calendar of its first ticker. Secondary
//! tickers whose dates diverge from it get carried-forward (possibly stale)
//! prices, so the engine checks compatibility before any state is created.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How the engine treats calendar differences between tickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarPolicy {
    /// Reject runs whose secondary tickers do not share the primary calendar.
    #[default]
    Strict,
    /// Accept any calendar and carry the last known close across gaps.
    CarryForward,
}

/// Calendar comparison for one secondary ticker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarMismatch {
    pub ticker: String,
    /// Primary trading dates the ticker has no close for.
    pub missing: Vec<NaiveDate>,
    /// Ticker dates that are not primary trading dates.
    pub extra: Vec<NaiveDate>,
}

impl CalendarMismatch {
    pub fn summary(&self) -> String {
        let first_missing = self
            .missing
            .first()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{}: {} missing (first {}), {} extra",
            self.ticker,
            self.missing.len(),
            first_missing,
            self.extra.len()
        )
    }
}

/// Result of comparing every ticker against the primary calendar.
#[derive(Debug, Clone, Default)]
pub struct CalendarReport {
    pub trading_days: usize,
    pub mismatches: Vec<CalendarMismatch>,
}

impl CalendarReport {
    /// Compare each `(ticker, dates)` pair against `calendar`.
    pub fn compare<'a, I>(calendar: &[NaiveDate], tickers: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Vec<NaiveDate>)>,
    {
        let primary: BTreeSet<NaiveDate> = calendar.iter().copied().collect();
        let mut mismatches = Vec::new();

        for (ticker, dates) in tickers {
            let dates: BTreeSet<NaiveDate> = dates.into_iter().collect();
            let missing: Vec<_> = primary.difference(&dates).copied().collect();
            let extra: Vec<_> = dates.difference(&primary).copied().collect();

            if !missing.is_empty() || !extra.is_empty() {
                mismatches.push(CalendarMismatch {
                    ticker: ticker.to_string(),
                    missing,
                    extra,
                });
            }
        }

        Self {
            trading_days: calendar.len(),
            mismatches,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.is_consistent() {
            return format!("{} trading days, all calendars aligned", self.trading_days);
        }
        let details: Vec<_> = self.mismatches.iter().map(|m| m.summary()).collect();
        format!(
            "{} trading days, {} mismatched: {}",
            self.trading_days,
            self.mismatches.len(),
            details.join("; ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    #[test]
    fn test_aligned_calendars() {
        let calendar = vec![day(1), day(2), day(5)];
        let report = CalendarReport::compare(&calendar, [("QQQ", calendar.clone())]);
        assert!(report.is_consistent());
        assert_eq!(report.trading_days, 3);
    }

    #[test]
    fn test_missing_and_extra_dates() {
        let calendar = vec![day(1), day(2), day(5)];
        let report = CalendarReport::compare(&calendar, [("QQQ", vec![day(1), day(3), day(5)])]);

        assert!(!report.is_consistent());
        let mismatch = &report.mismatches[0];
        assert_eq!(mismatch.ticker, "QQQ");
        assert_eq!(mismatch.missing, vec![day(2)]);
        assert_eq!(mismatch.extra, vec![day(3)]);
        assert!(report.summary().contains("QQQ: 1 missing"));
    }

    #[test]
    fn test_policy_default_is_strict() {
        assert_eq!(CalendarPolicy::default(), CalendarPolicy::Strict);
    }
}

//! Core data types for daily market series.
//!
//! Every series is a date-ordered list of observations with at most one
//! point per trading day. Prices are `Decimal` like the rest of the money
//! path; derived figures such as volatility are `f64`.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::source::DataError;

/// Option type (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl FromStr for OptionType {
    type Err = DataError;

    /// Accepts `C`/`CALL` and `P`/`PUT`, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "C" | "CALL" => Ok(Self::Call),
            "P" | "PUT" => Ok(Self::Put),
            other => Err(DataError::InvalidData(format!("unknown option type {:?}", other))),
        }
    }
}

impl OptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Put => "put",
        }
    }
}

/// A single dated observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint<T> {
    pub date: NaiveDate,
    pub value: T,
}

impl<T> DailyPoint<T> {
    pub fn new(date: NaiveDate, value: T) -> Self {
        Self { date, value }
    }
}

/// Date-ordered series with prefix and range slicing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries<T> {
    points: Vec<DailyPoint<T>>,
}

/// Daily closing prices.
pub type PriceSeries = DailySeries<Decimal>;

/// Daily annualized volatility.
pub type VolatilitySeries = DailySeries<f64>;

impl<T> Default for DailySeries<T> {
    fn default() -> Self {
        Self { points: Vec::new() }
    }
}

impl<T> DailySeries<T> {
    /// Build a series from unordered points.
    ///
    /// Points are sorted by date; when a date repeats the first occurrence
    /// wins.
    pub fn from_points(mut points: Vec<DailyPoint<T>>) -> Self {
        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[DailyPoint<T>] {
        &self.points
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    pub fn first(&self) -> Option<&DailyPoint<T>> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&DailyPoint<T>> {
        self.points.last()
    }

    /// All observations up to and including `date`.
    pub fn up_to(&self, date: NaiveDate) -> &[DailyPoint<T>] {
        let end = self.points.partition_point(|p| p.date <= date);
        &self.points[..end]
    }

    /// Observation on exactly `date`.
    pub fn get(&self, date: NaiveDate) -> Option<&T> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|idx| &self.points[idx].value)
    }

    /// Most recent observation on or before `date`.
    pub fn last_on_or_before(&self, date: NaiveDate) -> Option<&DailyPoint<T>> {
        self.up_to(date).last()
    }
}

impl<T: Clone> DailySeries<T> {
    /// Observations with `start <= date <= end`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let from = self.points.partition_point(|p| p.date < start);
        let to = self.points.partition_point(|p| p.date <= end);
        Self {
            points: self.points[from..to.max(from)].to_vec(),
        }
    }
}

impl<T> FromIterator<(NaiveDate, T)> for DailySeries<T> {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, T)>>(iter: I) -> Self {
        Self::from_points(
            iter.into_iter()
                .map(|(date, value)| DailyPoint::new(date, value))
                .collect(),
        )
    }
}

/// Closing prices of a slice as `f64`, for indicator math.
pub fn closes_as_f64(points: &[DailyPoint<Decimal>]) -> Vec<f64> {
    points
        .iter()
        .map(|p| p.value.try_into().unwrap_or(0.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn sample() -> PriceSeries {
        vec![
            (day(5), dec!(103)),
            (day(2), dec!(100)),
            (day(3), dec!(101)),
            (day(8), dec!(104)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_option_type_parsing() {
        assert_eq!("C".parse::<OptionType>().unwrap(), OptionType::Call);
        assert_eq!("P".parse::<OptionType>().unwrap(), OptionType::Put);
        assert_eq!("call".parse::<OptionType>().unwrap(), OptionType::Call);
        assert_eq!(" PUT ".parse::<OptionType>().unwrap(), OptionType::Put);
        assert!(matches!(
            "X".parse::<OptionType>(),
            Err(DataError::InvalidData(_))
        ));
    }

    #[test]
    fn test_series_is_sorted() {
        let series = sample();
        let dates: Vec<_> = series.dates().collect();
        assert_eq!(dates, vec![day(2), day(3), day(5), day(8)]);
    }

    #[test]
    fn test_up_to_includes_date() {
        let series = sample();
        assert_eq!(series.up_to(day(5)).len(), 3);
        assert_eq!(series.up_to(day(4)).len(), 2);
        assert!(series.up_to(day(1)).is_empty());
        assert_eq!(series.up_to(day(31)).len(), 4);
    }

    #[test]
    fn test_lookup_exact_and_prior() {
        let series = sample();
        assert_eq!(series.get(day(3)), Some(&dec!(101)));
        assert_eq!(series.get(day(4)), None);
        assert_eq!(series.last_on_or_before(day(4)).map(|p| p.value), Some(dec!(101)));
        assert!(series.last_on_or_before(day(1)).is_none());
    }

    #[test]
    fn test_between() {
        let series = sample();
        let window = series.between(day(3), day(5));
        assert_eq!(window.len(), 2);
        assert!(series.between(day(9), day(3)).is_empty());
    }

    #[test]
    fn test_duplicate_dates_keep_first() {
        let series: PriceSeries = vec![(day(2), dec!(1)), (day(2), dec!(2))].into_iter().collect();
        assert_eq!(series.len(), 1);
        assert_eq!(series.get(day(2)), Some(&dec!(1)));
    }
}

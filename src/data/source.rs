//! Market data collaborators.
//!
//! The engine only needs two things from the outside world: daily closes for
//! a ticker over a date range, and a daily volatility figure derived from
//! them. Both ranges are inclusive of `end`.

use std::collections::HashMap;

use chrono::NaiveDate;
use polars::prelude::PolarsError;
use thiserror::Error;

use super::types::{PriceSeries, VolatilitySeries};

#[derive(Error, Debug)]
pub enum DataError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("No data for ticker {0}")]
    UnknownTicker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of daily closing prices.
pub trait MarketDataSource: Sync {
    fn daily_closes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError>;
}

/// Source of daily annualized volatility.
pub trait VolatilitySource: Sync {
    fn volatility(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<VolatilitySeries, DataError>;
}

/// Map-backed market data, for tests and preloaded sweeps.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMarketData {
    closes: HashMap<String, PriceSeries>,
    volatility: HashMap<String, VolatilitySeries>,
}

impl InMemoryMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_closes(mut self, ticker: &str, series: PriceSeries) -> Self {
        self.closes.insert(ticker.to_string(), series);
        self
    }

    /// Attach an explicit volatility series instead of deriving one.
    pub fn with_volatility(mut self, ticker: &str, series: VolatilitySeries) -> Self {
        self.volatility.insert(ticker.to_string(), series);
        self
    }
}

impl MarketDataSource for InMemoryMarketData {
    fn daily_closes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        self.closes
            .get(ticker)
            .map(|s| s.between(start, end))
            .ok_or_else(|| DataError::UnknownTicker(ticker.to_string()))
    }
}

impl VolatilitySource for InMemoryMarketData {
    /// Returns the attached series, or an empty one when none was attached.
    fn volatility(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<VolatilitySeries, DataError> {
        Ok(self
            .volatility
            .get(ticker)
            .map(|s| s.between(start, end))
            .unwrap_or_default())
    }
}

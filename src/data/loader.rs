//! Data loader for daily close files.
//!
//! Loads one file per ticker from a data directory, either
//! `<dir>/<TICKER>.parquet` or `<dir>/<TICKER>.csv`. Parquet wins when both
//! exist. The file must contain at least:
//! - `date`: trading date, as a `YYYY-MM-DD` string or a Date column
//! - `close`: closing price (any numeric type)

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use polars::prelude::*;
use rust_decimal::Decimal;
use tracing::debug;

use super::source::{DataError, MarketDataSource};
use super::types::{DailyPoint, PriceSeries};

/// Expected columns in the price files.
pub const EXPECTED_COLUMNS: &[&str] = &["date", "close"];

/// File-backed close-price loader.
pub struct DataLoader {
    data_dir: String,
}

impl DataLoader {
    /// Create a new data loader pointing to a directory of price files.
    pub fn new(data_dir: &str) -> Self {
        Self {
            data_dir: data_dir.to_string(),
        }
    }

    fn file_path(&self, ticker: &str, extension: &str) -> PathBuf {
        Path::new(&self.data_dir).join(format!("{}.{}", ticker, extension))
    }

    /// List tickers with a price file in the data directory.
    pub fn available_tickers(&self) -> Result<Vec<String>, DataError> {
        let path = Path::new(&self.data_dir);
        if !path.exists() {
            return Ok(vec![]);
        }

        let mut tickers = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let path = entry?.path();
            let is_price_file = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("parquet") | Some("csv")
            );
            if is_price_file {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    tickers.push(stem.to_string());
                }
            }
        }
        tickers.sort();
        tickers.dedup();
        Ok(tickers)
    }

    /// Load a ticker's file as a LazyFrame.
    pub fn load_lazy(&self, ticker: &str) -> Result<LazyFrame, DataError> {
        let parquet = self.file_path(ticker, "parquet");
        if parquet.exists() {
            return Ok(LazyFrame::scan_parquet(&parquet, ScanArgsParquet::default())?);
        }

        let csv = self.file_path(ticker, "csv");
        if csv.exists() {
            return Ok(LazyCsvReader::new(&csv).with_has_header(true).finish()?);
        }

        Err(DataError::FileNotFound(parquet.display().to_string()))
    }

    /// Load the full close series for a ticker.
    pub fn load_closes(&self, ticker: &str) -> Result<PriceSeries, DataError> {
        let df = self
            .load_lazy(ticker)?
            .select([col("date"), col("close")])
            .collect()?;
        let series = dataframe_to_series(&df)?;
        debug!(ticker, rows = series.len(), "loaded close series");
        Ok(series)
    }
}

impl MarketDataSource for DataLoader {
    fn daily_closes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        Ok(self.load_closes(ticker)?.between(start, end))
    }
}

/// Convert days since Unix epoch to NaiveDate.
fn date_from_days(days: i32) -> NaiveDate {
    NaiveDate::from_num_days_from_ce_opt(days + 719163).unwrap_or_default()
}

/// Convert a `date`/`close` DataFrame to a price series.
///
/// Rows with an unparseable date or a missing close are skipped.
fn dataframe_to_series(df: &DataFrame) -> Result<PriceSeries, DataError> {
    let date_col = df.column("date")?;

    // Handle both string and date column types
    let dates: Vec<Option<NaiveDate>> = if let Ok(str_col) = date_col.str() {
        str_col
            .into_iter()
            .map(|s| s.and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()))
            .collect()
    } else if let Ok(day_col) = date_col.date() {
        day_col.into_iter().map(|d| d.map(date_from_days)).collect()
    } else {
        return Err(DataError::InvalidData(
            "date column has unexpected type".to_string(),
        ));
    };

    let close_col = df.column("close")?.cast(&DataType::Float64)?;
    let closes: Vec<Option<f64>> = close_col.f64()?.into_iter().collect();

    let points = dates
        .into_iter()
        .zip(closes)
        .filter_map(|(date, close)| {
            let date = date?;
            let close = Decimal::try_from(close?).ok()?;
            Some(DailyPoint::new(date, close))
        })
        .collect();

    Ok(PriceSeries::from_points(points))
}

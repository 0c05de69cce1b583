pub mod calendar;
pub mod loader;
pub mod market;
pub mod source;
pub mod types;
pub mod volatility;

pub use calendar::{CalendarMismatch, CalendarPolicy, CalendarReport};
pub use loader::{DataLoader, EXPECTED_COLUMNS};
pub use market::MarketData;
pub use source::{DataError, InMemoryMarketData, MarketDataSource, VolatilitySource};
pub use types::{
    closes_as_f64, DailyPoint, DailySeries, OptionType, PriceSeries, VolatilitySeries,
};
pub use volatility::{
    historical_volatility, HistoricalVolatility, DEFAULT_VOLATILITY_WINDOW,
    TRADING_DAYS_PER_YEAR,
};

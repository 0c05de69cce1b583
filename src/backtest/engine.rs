//! Core backtesting engine.
//!
//! Runs the simulation loop, one trading day at a time:
//! 1. Open the day's trading-action context
//! 2. Resolve the current close for every ticker
//! 3. Resolve expired options (assignment of in-the-money short options)
//! 4. Build the market snapshot (history truncated to the day)
//! 5. Invoke the strategy
//! 6. Revalue the portfolio and record a valuation snapshot

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::data::{
    CalendarPolicy, DataError, HistoricalVolatility, MarketData, MarketDataSource, OptionType,
    VolatilitySource, DEFAULT_VOLATILITY_WINDOW,
};
use crate::metrics::SummaryStatistics;
use crate::portfolio::{OptionDirection, Portfolio, PriceMap, ValuationBreakdown};
use crate::strategy::{MarketSnapshot, Strategy};

use super::actions::TradingActions;
use super::transaction::Transaction;

/// Errors that prevent a backtest from starting.
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Calendar mismatch: {0}")]
    CalendarMismatch(String),

    #[error("No trading days between {0} and {1}")]
    EmptyCalendar(NaiveDate, NaiveDate),
}

/// Configuration for backtest execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Tickers to load. The first one defines the trading calendar.
    pub tickers: Vec<String>,

    /// First simulated day (inclusive).
    pub start_date: NaiveDate,

    /// Last simulated day (inclusive).
    pub end_date: NaiveDate,

    /// Starting cash.
    pub initial_cash: Decimal,

    /// Risk-free rate used for valuation.
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,

    /// Trailing window (returns) for historical volatility.
    #[serde(default = "default_volatility_window")]
    pub volatility_window: usize,

    /// Handling of secondary tickers whose dates differ from the primary.
    #[serde(default)]
    pub calendar_policy: CalendarPolicy,
}

fn default_risk_free_rate() -> f64 {
    0.05
}

fn default_volatility_window() -> usize {
    DEFAULT_VOLATILITY_WINDOW
}

impl BacktestConfig {
    pub fn new(tickers: &[&str], start_date: NaiveDate, end_date: NaiveDate, initial_cash: Decimal) -> Self {
        Self {
            tickers: tickers.iter().map(|t| t.to_string()).collect(),
            start_date,
            end_date,
            initial_cash,
            risk_free_rate: default_risk_free_rate(),
            volatility_window: default_volatility_window(),
            calendar_policy: CalendarPolicy::default(),
        }
    }

    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<(), BacktestError> {
        if self.tickers.is_empty() {
            return Err(BacktestError::InvalidConfig("at least one ticker is required".to_string()));
        }
        if self.tickers.iter().any(|t| t.trim().is_empty()) {
            return Err(BacktestError::InvalidConfig("ticker symbols must not be blank".to_string()));
        }
        if self.end_date < self.start_date {
            return Err(BacktestError::InvalidConfig(format!(
                "end date {} is before start date {}",
                self.end_date, self.start_date
            )));
        }
        if self.initial_cash < Decimal::ZERO {
            return Err(BacktestError::InvalidConfig(format!(
                "initial cash {} is negative",
                self.initial_cash
            )));
        }
        if self.volatility_window < 2 {
            return Err(BacktestError::InvalidConfig(
                "volatility window must cover at least 2 returns".to_string(),
            ));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(BacktestError::InvalidConfig("risk-free rate must be finite".to_string()));
        }
        Ok(())
    }
}

/// Validate `config` against `market` and return the trading days in
/// `[start_date, end_date]`.
///
/// Under the strict policy every secondary ticker must share the primary
/// calendar.
pub(crate) fn trading_calendar(
    config: &BacktestConfig,
    market: &MarketData,
) -> Result<Vec<NaiveDate>, BacktestError> {
    config.validate()?;

    if config.calendar_policy == CalendarPolicy::Strict {
        let report = market.calendar_report();
        if !report.is_consistent() {
            return Err(BacktestError::CalendarMismatch(report.summary()));
        }
    }

    let calendar: Vec<NaiveDate> = market
        .calendar()
        .iter()
        .copied()
        .filter(|d| *d >= config.start_date && *d <= config.end_date)
        .collect();
    if calendar.is_empty() {
        return Err(BacktestError::EmptyCalendar(config.start_date, config.end_date));
    }
    Ok(calendar)
}

/// Daily valuation snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationSnapshot {
    pub date: NaiveDate,
    pub cash: Decimal,
    pub stock_value: Decimal,
    pub options_value: Decimal,
    pub total_value: Decimal,
}

impl ValuationSnapshot {
    fn new(date: NaiveDate, breakdown: ValuationBreakdown) -> Self {
        Self {
            date,
            cash: breakdown.cash,
            stock_value: breakdown.stock_value,
            options_value: breakdown.options_value,
            total_value: breakdown.total_value,
        }
    }
}

/// A single backtest: one strategy over one preloaded data set.
pub struct Backtest {
    config: BacktestConfig,
    strategy: Box<dyn Strategy>,
    market: Arc<MarketData>,
    calendar: Vec<NaiveDate>,
    portfolio: Portfolio,
    transactions: Vec<Transaction>,
    history: Vec<ValuationSnapshot>,
}

impl Backtest {
    /// Load data from the given sources and prepare a run.
    pub fn new(
        config: BacktestConfig,
        strategy: Box<dyn Strategy>,
        prices: &dyn MarketDataSource,
        volatility: &dyn VolatilitySource,
    ) -> Result<Self, BacktestError> {
        config.validate()?;
        let market = MarketData::load(
            &config.tickers,
            config.start_date,
            config.end_date,
            prices,
            volatility,
        )?;
        Self::with_market_data(config, strategy, Arc::new(market))
    }

    /// Load closes from `prices` and derive historical volatility from them
    /// with the configured window.
    pub fn from_source(
        config: BacktestConfig,
        strategy: Box<dyn Strategy>,
        prices: &dyn MarketDataSource,
    ) -> Result<Self, BacktestError> {
        let volatility = HistoricalVolatility::new(prices, config.volatility_window);
        Self::new(config, strategy, prices, &volatility)
    }

    /// Prepare a run over already loaded, possibly shared, market data.
    pub fn with_market_data(
        config: BacktestConfig,
        strategy: Box<dyn Strategy>,
        market: Arc<MarketData>,
    ) -> Result<Self, BacktestError> {
        let calendar = trading_calendar(&config, &market)?;

        let portfolio = Portfolio::new(config.initial_cash);
        Ok(Self {
            config,
            strategy,
            market,
            calendar,
            portfolio,
            transactions: Vec::new(),
            history: Vec::new(),
        })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    /// Trading days the run walks, in order.
    pub fn calendar(&self) -> &[NaiveDate] {
        &self.calendar
    }

    /// Run the simulation from a fresh portfolio.
    ///
    /// State from any previous run is discarded first, so repeated calls
    /// produce identical results.
    pub fn run(&mut self) -> &[ValuationSnapshot] {
        self.portfolio = Portfolio::new(self.config.initial_cash);
        self.transactions.clear();
        self.history.clear();
        self.strategy.reset();

        info!(
            strategy = self.strategy.name(),
            tickers = ?self.config.tickers,
            days = self.calendar.len(),
            "Starting backtest"
        );

        let market = Arc::clone(&self.market);
        let calendar = std::mem::take(&mut self.calendar);
        for &date in &calendar {
            self.process_day(&market, date);
        }
        self.calendar = calendar;

        if let Some(last) = self.history.last() {
            info!(
                final_value = %last.total_value,
                transactions = self.transactions.len(),
                "Backtest complete"
            );
        }

        &self.history
    }

    /// Process a single trading day.
    fn process_day(&mut self, market: &MarketData, date: NaiveDate) {
        let prices = self.resolve_prices(market, date);

        {
            let mut actions = TradingActions::new(date, &mut self.portfolio, &mut self.transactions);
            resolve_expirations(&mut actions, &prices);

            let snapshot = MarketSnapshot::new(date, &prices, market);
            self.strategy.on_day(&snapshot, &mut actions);
        }

        let volatility = market
            .primary_ticker()
            .and_then(|t| market.volatility(t))
            .and_then(|s| s.up_to(date).last())
            .map(|p| p.value);
        let breakdown = self
            .portfolio
            .valuation(date, &prices, volatility, self.config.risk_free_rate);
        self.history.push(ValuationSnapshot::new(date, breakdown));
    }

    /// Close for every configured ticker: exact date, else the latest prior
    /// close, else 0.
    fn resolve_prices(&self, market: &MarketData, date: NaiveDate) -> PriceMap {
        self.config
            .tickers
            .iter()
            .map(|ticker| {
                let price = market.close_on(ticker, date).unwrap_or_else(|| {
                    debug!(%date, ticker = ticker.as_str(), "No close available, using 0");
                    Decimal::ZERO
                });
                (ticker.clone(), price)
            })
            .collect()
    }

    pub fn history(&self) -> &[ValuationSnapshot] {
        &self.history
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    /// Closes used on the last simulated day, or `None` before any run.
    pub fn last_prices(&self) -> Option<PriceMap> {
        let last = self.history.last()?;
        Some(self.resolve_prices(&self.market, last.date))
    }

    pub fn summary_statistics(&self) -> SummaryStatistics {
        SummaryStatistics::from_history(&self.history, self.config.initial_cash)
    }
}

/// Remove expired options and assign in-the-money short contracts.
///
/// A short call at or above its strike sells `contracts × 100` shares at the
/// strike; a short put at or below its strike buys them. Both skip the
/// normal share and cash checks. Long and out-of-the-money contracts simply
/// lapse.
fn resolve_expirations(actions: &mut TradingActions<'_>, prices: &PriceMap) {
    let date = actions.date();
    for contract in actions.take_expired() {
        let price = prices.get(&contract.ticker).copied().unwrap_or(Decimal::ZERO);
        let shares = contract.notional_shares();

        match (contract.direction, contract.option_type) {
            (OptionDirection::Short, OptionType::Call) if price >= contract.strike => {
                debug!(%date, ticker = contract.ticker.as_str(), strike = %contract.strike, %price, "Call assigned");
                actions.record_exercise(&contract, price);
                actions.force_sell_stock(&contract.ticker, shares, contract.strike);
            }
            (OptionDirection::Short, OptionType::Put) if price <= contract.strike => {
                debug!(%date, ticker = contract.ticker.as_str(), strike = %contract.strike, %price, "Put assigned");
                actions.record_exercise(&contract, price);
                actions.force_buy_stock(&contract.ticker, shares, contract.strike);
            }
            _ => {
                debug!(%date, ticker = contract.ticker.as_str(), strike = %contract.strike, "Option expired");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    use crate::backtest::TransactionKind;
    use crate::data::{InMemoryMarketData, PriceSeries, VolatilitySeries};
    use crate::strategy::{BuyAndHold, BuyAndHoldConfig, SmaCrossover, SmaCrossoverConfig};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn series(points: &[(u32, Decimal)]) -> PriceSeries {
        points.iter().map(|(d, p)| (day(*d), *p)).collect()
    }

    type Step = fn(&mut TradingActions<'_>);

    /// Runs a fixed script of actions keyed by date.
    struct Scripted {
        script: Vec<(NaiveDate, Step)>,
    }

    fn covered_call_at_100(a: &mut TradingActions<'_>) {
        assert!(a.buy_stock("SPY", dec!(100), dec!(100)));
        assert!(a.sell_call("SPY", dec!(100), day(5), 1, dec!(2)));
    }

    fn short_two_puts(a: &mut TradingActions<'_>) {
        assert!(a.sell_put("SPY", dec!(95), day(8), 2, dec!(1)));
    }

    fn long_atm_call(a: &mut TradingActions<'_>) {
        assert!(a.buy_call("SPY", dec!(100), day(1) + Duration::days(30), 1, dec!(3)));
    }

    impl Strategy for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn on_day(&mut self, market: &MarketSnapshot<'_>, actions: &mut TradingActions<'_>) {
            for (date, step) in &self.script {
                if *date == market.date() {
                    step(actions);
                }
            }
        }
    }

    fn config(start: u32, end: u32) -> BacktestConfig {
        BacktestConfig::new(&["SPY"], day(start), day(end), dec!(10_000))
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        let mut bad = config(5, 1);
        assert!(matches!(bad.validate(), Err(BacktestError::InvalidConfig(_))));

        bad = config(1, 5);
        bad.tickers.clear();
        assert!(bad.validate().is_err());

        bad = config(1, 5);
        bad.initial_cash = dec!(-1);
        assert!(bad.validate().is_err());

        assert!(config(1, 5).validate().is_ok());
    }

    #[test]
    fn test_short_call_assigned_at_expiration() {
        let data = InMemoryMarketData::new()
            .with_closes("SPY", series(&[(1, dec!(100)), (4, dec!(110)), (5, dec!(120))]));

        let strategy = Scripted {
            script: vec![(day(1), covered_call_at_100 as Step)],
        };

        let mut backtest = Backtest::new(config(1, 5), Box::new(strategy), &data, &data).unwrap();
        backtest.run();

        let kinds: Vec<_> = backtest.transactions().iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TransactionKind::BuyStock,
                TransactionKind::SellCall,
                TransactionKind::CallExercised,
                TransactionKind::SellStock,
            ]
        );

        assert_eq!(
            backtest.last_prices().and_then(|p| p.get("SPY").copied()),
            Some(dec!(120))
        );

        let sale = &backtest.transactions()[3];
        assert_eq!(sale.price, dec!(100));
        assert_eq!(sale.quantity, dec!(100));
        assert_eq!(sale.date, day(5));
        assert!(backtest.portfolio().options().is_empty());
        assert!(backtest.portfolio().position("SPY").is_none());
        // 10_000 - 10_000 + 200 + 10_000
        assert_eq!(backtest.portfolio().cash(), dec!(10_200));
    }

    #[test]
    fn test_out_of_the_money_call_lapses() {
        let data = InMemoryMarketData::new()
            .with_closes("SPY", series(&[(1, dec!(100)), (5, dec!(99))]));

        let strategy = Scripted {
            script: vec![(day(1), covered_call_at_100 as Step)],
        };

        let mut backtest = Backtest::new(config(1, 5), Box::new(strategy), &data, &data).unwrap();
        backtest.run();

        assert_eq!(backtest.transactions().len(), 2);
        assert_eq!(backtest.portfolio().shares_held("SPY"), dec!(100));
        assert!(backtest.portfolio().options().is_empty());
    }

    #[test]
    fn test_put_assignment_can_overdraw_cash() {
        let data = InMemoryMarketData::new()
            .with_closes("SPY", series(&[(1, dec!(100)), (8, dec!(80))]));

        let strategy = Scripted {
            script: vec![(day(1), short_two_puts as Step)],
        };

        let mut backtest = Backtest::new(config(1, 8), Box::new(strategy), &data, &data).unwrap();
        backtest.run();

        let kinds: Vec<_> = backtest.transactions().iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TransactionKind::SellPut,
                TransactionKind::PutExercised,
                TransactionKind::BuyStock,
            ]
        );
        // 10_000 + 200 - 19_000
        assert_eq!(backtest.portfolio().cash(), dec!(-8_800));
        assert_eq!(backtest.portfolio().shares_held("SPY"), dec!(200));
        let last = backtest.history().last().unwrap();
        assert_eq!(last.total_value, dec!(-8_800) + dec!(200) * dec!(80));
    }

    #[test]
    fn test_history_one_snapshot_per_day() {
        let data = InMemoryMarketData::new().with_closes(
            "SPY",
            series(&[(1, dec!(100)), (4, dec!(101)), (5, dec!(103)), (6, dec!(102))]),
        );
        let strategy = BuyAndHold::new(BuyAndHoldConfig {
            ticker: "SPY".to_string(),
        });

        let mut backtest = Backtest::new(config(1, 6), Box::new(strategy), &data, &data).unwrap();
        assert!(backtest.last_prices().is_none());
        let history = backtest.run().to_vec();

        let dates: Vec<_> = history.iter().map(|h| h.date).collect();
        assert_eq!(dates, vec![day(1), day(4), day(5), day(6)]);
        assert_eq!(history[0].total_value, dec!(10_000));
        assert_eq!(history[3].stock_value, dec!(10_200));
        for h in &history {
            assert_eq!(h.total_value, h.cash + h.stock_value + h.options_value);
        }

        let prices = backtest.last_prices().unwrap();
        let position = backtest.portfolio().position("SPY").unwrap();
        assert_eq!(position.unrealized_pnl(prices["SPY"]), dec!(200));
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let data = InMemoryMarketData::new()
            .with_closes("SPY", series(&[(1, dec!(100)), (4, dec!(110)), (5, dec!(120))]));
        let strategy = BuyAndHold::new(BuyAndHoldConfig {
            ticker: "SPY".to_string(),
        });

        let mut backtest = Backtest::new(config(1, 5), Box::new(strategy), &data, &data).unwrap();
        let first = backtest.run().to_vec();
        let first_tx = backtest.transactions().to_vec();
        let second = backtest.run().to_vec();

        assert_eq!(first, second);
        assert_eq!(first_tx, backtest.transactions());
    }

    #[test]
    fn test_strict_calendar_rejects_gaps() {
        let data = InMemoryMarketData::new()
            .with_closes("SPY", series(&[(1, dec!(100)), (4, dec!(101))]))
            .with_closes("QQQ", series(&[(1, dec!(300))]));
        let mut cfg = BacktestConfig::new(&["SPY", "QQQ"], day(1), day(4), dec!(10_000));

        let strategy = BuyAndHold::new(BuyAndHoldConfig {
            ticker: "SPY".to_string(),
        });
        let result = Backtest::new(cfg.clone(), Box::new(strategy), &data, &data);
        assert!(matches!(result, Err(BacktestError::CalendarMismatch(_))));

        cfg.calendar_policy = CalendarPolicy::CarryForward;
        let strategy = BuyAndHold::new(BuyAndHoldConfig {
            ticker: "SPY".to_string(),
        });
        let mut backtest = Backtest::new(cfg, Box::new(strategy), &data, &data).unwrap();
        backtest.run();
        assert_eq!(backtest.history().len(), 2);
    }

    #[test]
    fn test_empty_calendar() {
        let data = InMemoryMarketData::new().with_closes("SPY", series(&[(1, dec!(100))]));
        let strategy = BuyAndHold::new(BuyAndHoldConfig {
            ticker: "SPY".to_string(),
        });
        let result = Backtest::new(config(2, 5), Box::new(strategy), &data, &data);
        assert!(matches!(result, Err(BacktestError::EmptyCalendar(_, _))));
    }

    #[test]
    fn test_sma_crossover_end_to_end() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        // falling, rising, then falling again
        let closes: Vec<Decimal> = (0..25)
            .map(|i| Decimal::from(100 - i))
            .chain((1..=25).map(|i| Decimal::from(76 + 2 * i)))
            .chain((1..=25).map(|i| Decimal::from(126 - 2 * i)))
            .collect();
        let series: PriceSeries = closes
            .iter()
            .enumerate()
            .map(|(i, c)| (start + Duration::days(i as i64), *c))
            .collect();
        let data = InMemoryMarketData::new().with_closes("SPY", series);
        let config = BacktestConfig::new(&["SPY"], start, start + Duration::days(74), dec!(10_000));
        let strategy = SmaCrossover::new(SmaCrossoverConfig::new("SPY", 5, 20));

        let mut backtest = Backtest::from_source(config, Box::new(strategy), &data).unwrap();
        backtest.run();

        let tx = backtest.transactions();
        assert_eq!(tx.len(), 2);
        assert_eq!(tx[0].kind, TransactionKind::BuyStock);
        assert_eq!(tx[0].date, start + Duration::days(30));
        assert_eq!(tx[1].kind, TransactionKind::SellStock);
        assert_eq!(tx[1].date, start + Duration::days(57));
        assert_eq!(tx[0].quantity, tx[1].quantity);
        assert_eq!(backtest.history().len(), 75);

        let stats = backtest.summary_statistics();
        assert_eq!(stats.final_value, backtest.history()[74].total_value);
        assert_eq!(stats.initial_value, dec!(10_000));
    }

    #[test]
    fn test_options_valued_with_primary_volatility() {
        let closes = series(&[(1, dec!(100)), (4, dec!(100))]);
        let vol: VolatilitySeries = vec![(day(1), 0.3)].into_iter().collect();
        let data = InMemoryMarketData::new()
            .with_closes("SPY", closes)
            .with_volatility("SPY", vol);

        let strategy = Scripted {
            script: vec![(day(1), long_atm_call as Step)],
        };

        let mut backtest = Backtest::new(config(1, 4), Box::new(strategy), &data, &data).unwrap();
        backtest.run();

        // at-the-money call keeps time value rather than dropping to intrinsic 0
        let last = backtest.history().last().unwrap();
        assert!(last.options_value > dec!(0));
    }
}

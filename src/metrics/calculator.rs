//! Summary statistics over a valuation history.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::backtest::ValuationSnapshot;

/// Trading days per year used for annualization.
pub const ANNUALIZATION_DAYS: f64 = 252.0;

/// Headline statistics for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub initial_value: Decimal,
    pub final_value: Decimal,
    pub total_return_pct: f64,
    /// Annualized, zero risk-free rate.
    pub sharpe_ratio: f64,
    pub max_drawdown_pct: f64,
    /// Annualized standard deviation of daily returns, in percent.
    pub volatility_pct: f64,
    pub cagr_pct: f64,
    pub sortino_ratio: f64,
    pub trading_days: usize,
    pub drawdown: DrawdownAnalysis,
}

impl SummaryStatistics {
    /// Compute statistics from a run's history.
    ///
    /// With an empty history the final value equals `initial_value`.
    pub fn from_history(history: &[ValuationSnapshot], initial_value: Decimal) -> Self {
        let final_value = history
            .last()
            .map(|h| h.total_value)
            .unwrap_or(initial_value);

        let init = to_f64(initial_value);
        let fin = to_f64(final_value);
        let total_return_pct = if init != 0.0 {
            (fin / init - 1.0) * 100.0
        } else {
            0.0
        };

        let returns = daily_returns(history);
        let (sharpe_ratio, volatility_pct) = if returns.len() < 2 {
            (0.0, 0.0)
        } else {
            let mean = returns.iter().mean();
            let std = returns.iter().std_dev();
            let sharpe = if std > 0.0 {
                mean / std * ANNUALIZATION_DAYS.sqrt()
            } else {
                0.0
            };
            (sharpe, std * ANNUALIZATION_DAYS.sqrt() * 100.0)
        };

        let drawdown = DrawdownAnalysis::from_history(history);

        Self {
            initial_value,
            final_value,
            total_return_pct,
            sharpe_ratio,
            max_drawdown_pct: drawdown.max_drawdown_pct,
            volatility_pct,
            cagr_pct: cagr_pct(initial_value, final_value, history.len()),
            sortino_ratio: sortino_ratio(&returns),
            trading_days: history.len(),
            drawdown,
        }
    }

    /// Generate a summary report.
    pub fn summary(&self) -> String {
        let recovery = self
            .drawdown
            .recovery_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "not recovered".to_string());

        format!(
            "Performance Summary\n\
             ====================\n\
             \n\
             Initial Value: ${:.2}\n\
             Final Value: ${:.2}\n\
             Total Return: {:.2}%\n\
             CAGR: {:.2}%\n\
             \n\
             Sharpe Ratio: {:.2}\n\
             Sortino Ratio: {:.2}\n\
             Volatility: {:.2}%\n\
             \n\
             Max Drawdown: {:.2}%\n\
             Recovery: {}\n\
             Trading Days: {}",
            self.initial_value,
            self.final_value,
            self.total_return_pct,
            self.cagr_pct,
            self.sharpe_ratio,
            self.sortino_ratio,
            self.volatility_pct,
            self.max_drawdown_pct,
            recovery,
            self.trading_days
        )
    }
}

/// Drawdown analysis details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawdownAnalysis {
    pub max_drawdown: Decimal,
    pub max_drawdown_pct: f64,
    /// Peak preceding the deepest trough.
    pub peak_date: Option<NaiveDate>,
    pub trough_date: Option<NaiveDate>,
    /// First day the value regains the peak after the deepest trough.
    pub recovery_date: Option<NaiveDate>,
    pub drawdown_periods: usize,
}

impl DrawdownAnalysis {
    pub fn from_history(history: &[ValuationSnapshot]) -> Self {
        let Some(first) = history.first() else {
            return Self::default();
        };

        let mut peak = first.total_value;
        let mut peak_date = first.date;
        let mut analysis = Self::default();
        let mut in_drawdown = false;

        for point in history {
            if point.total_value >= peak {
                if in_drawdown {
                    analysis.drawdown_periods += 1;
                    in_drawdown = false;
                    if analysis.recovery_date.is_none() && analysis.peak_date == Some(peak_date) {
                        analysis.recovery_date = Some(point.date);
                    }
                }
                peak = point.total_value;
                peak_date = point.date;
                continue;
            }

            in_drawdown = true;
            let drawdown = peak - point.total_value;
            let drawdown_pct = if peak > Decimal::ZERO {
                to_f64(drawdown) / to_f64(peak) * 100.0
            } else {
                0.0
            };

            if drawdown_pct > analysis.max_drawdown_pct {
                analysis.max_drawdown = drawdown;
                analysis.max_drawdown_pct = drawdown_pct;
                analysis.peak_date = Some(peak_date);
                analysis.trough_date = Some(point.date);
                analysis.recovery_date = None;
            }
        }

        analysis
    }
}

/// Day-over-day percentage changes of total value.
///
/// Pairs with a zero previous value or a non-finite result are skipped.
pub fn daily_returns(history: &[ValuationSnapshot]) -> Vec<f64> {
    history
        .windows(2)
        .filter_map(|w| {
            let prev = to_f64(w[0].total_value);
            let curr = to_f64(w[1].total_value);
            if prev == 0.0 {
                return None;
            }
            let r = (curr - prev) / prev;
            r.is_finite().then_some(r)
        })
        .collect()
}

/// Compound annual growth rate in percent.
pub fn cagr_pct(initial: Decimal, final_value: Decimal, trading_days: usize) -> f64 {
    let init = to_f64(initial);
    let fin = to_f64(final_value);

    if init <= 0.0 || fin <= 0.0 || trading_days == 0 {
        return 0.0;
    }

    let years = trading_days as f64 / ANNUALIZATION_DAYS;
    ((fin / init).powf(1.0 / years) - 1.0) * 100.0
}

/// Annualized Sortino ratio (downside deviation over all observations).
pub fn sortino_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let mean = returns.iter().mean();
    let downside_variance = returns
        .iter()
        .filter(|&&r| r < 0.0)
        .map(|r| r.powi(2))
        .sum::<f64>()
        / returns.len() as f64;
    let downside_dev = downside_variance.sqrt();

    if downside_dev == 0.0 {
        return 0.0;
    }

    mean / downside_dev * ANNUALIZATION_DAYS.sqrt()
}

fn to_f64(value: Decimal) -> f64 {
    value.try_into().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn history(values: &[Decimal]) -> Vec<ValuationSnapshot> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| ValuationSnapshot {
                date: start + chrono::Duration::days(i as i64),
                cash: *v,
                stock_value: Decimal::ZERO,
                options_value: Decimal::ZERO,
                total_value: *v,
            })
            .collect()
    }

    #[test]
    fn test_total_return_and_drawdown() {
        let h = history(&[dec!(100), dec!(120), dec!(90), dec!(110)]);
        let stats = SummaryStatistics::from_history(&h, dec!(100));

        assert_eq!(stats.final_value, dec!(110));
        assert!((stats.total_return_pct - 10.0).abs() < 1e-9);
        assert!((stats.max_drawdown_pct - 25.0).abs() < 1e-9);
        assert_eq!(stats.drawdown.max_drawdown, dec!(30));
        assert_eq!(stats.drawdown.peak_date, Some(h[1].date));
        assert_eq!(stats.drawdown.trough_date, Some(h[2].date));
        assert_eq!(stats.drawdown.recovery_date, None);
    }

    #[test]
    fn test_sharpe_and_volatility() {
        let h = history(&[dec!(100), dec!(110), dec!(99), dec!(108.9)]);
        let stats = SummaryStatistics::from_history(&h, dec!(100));

        // returns: +10%, -10%, +10%
        let mean = 0.1 / 3.0;
        let std = ((2.0 * (0.1f64 - mean).powi(2) + (-0.1f64 - mean).powi(2)) / 2.0).sqrt();
        assert!((stats.sharpe_ratio - mean / std * 252f64.sqrt()).abs() < 1e-9);
        assert!((stats.volatility_pct - std * 252f64.sqrt() * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_too_few_returns() {
        let stats = SummaryStatistics::from_history(&history(&[dec!(100), dec!(105)]), dec!(100));
        assert_eq!(stats.sharpe_ratio, 0.0);
        assert_eq!(stats.volatility_pct, 0.0);

        let empty = SummaryStatistics::from_history(&[], dec!(100));
        assert_eq!(empty.final_value, dec!(100));
        assert_eq!(empty.total_return_pct, 0.0);
        assert_eq!(empty.max_drawdown_pct, 0.0);
    }

    #[test]
    fn test_zero_previous_value_skipped() {
        let h = history(&[dec!(0), dec!(100), dec!(110), dec!(121)]);
        let returns = daily_returns(&h);
        assert_eq!(returns.len(), 2);
        assert!((returns[0] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_recovery_date() {
        let h = history(&[dec!(100), dec!(80), dec!(95), dec!(100), dec!(105)]);
        let dd = DrawdownAnalysis::from_history(&h);
        assert!((dd.max_drawdown_pct - 20.0).abs() < 1e-9);
        assert_eq!(dd.recovery_date, Some(h[3].date));
        assert_eq!(dd.drawdown_periods, 1);
    }

    #[test]
    fn test_cagr() {
        // 100K -> 121K over 2 years (504 days) = 10% CAGR
        let cagr = cagr_pct(dec!(100_000), dec!(121_000), 504);
        assert!((cagr - 10.0).abs() < 1e-6);
        assert_eq!(cagr_pct(dec!(0), dec!(10), 10), 0.0);
    }

    #[test]
    fn test_sortino_no_losses() {
        assert_eq!(sortino_ratio(&[0.01, 0.02, 0.03]), 0.0);
        assert!(sortino_ratio(&[0.02, -0.01, 0.03]) > 0.0);
    }

    #[test]
    fn test_summary_text() {
        let stats = SummaryStatistics::from_history(&history(&[dec!(100), dec!(110)]), dec!(100));
        let text = stats.summary();
        assert!(text.contains("Total Return: 10.00%"));
        assert!(text.contains("Final Value: $110.00"));
    }
}

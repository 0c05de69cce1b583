//! Buy once with all available cash, then hold.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::backtest::TradingActions;

use super::{affordable_shares, MarketSnapshot, Strategy};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyAndHoldConfig {
    pub ticker: String,
}

#[derive(Debug, Clone)]
pub struct BuyAndHold {
    config: BuyAndHoldConfig,
    entered: bool,
}

impl BuyAndHold {
    pub fn new(config: BuyAndHoldConfig) -> Self {
        Self {
            config,
            entered: false,
        }
    }
}

impl Strategy for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn on_day(&mut self, market: &MarketSnapshot<'_>, actions: &mut TradingActions<'_>) {
        if self.entered {
            return;
        }
        let ticker = self.config.ticker.as_str();
        let Some(price) = market.price(ticker) else {
            return;
        };
        if !actions.portfolio().shares_held(ticker).is_zero() {
            return;
        }

        let shares = affordable_shares(actions.portfolio().cash(), price);
        if shares > Decimal::ZERO && actions.buy_stock(ticker, shares, price) {
            self.entered = true;
        }
    }

    fn reset(&mut self) {
        self.entered = false;
    }
}

//! Portfolio state and valuation.

pub mod position;
pub mod state;
pub mod valuation;

pub use position::{contract_shares, OptionContract, OptionDirection, Position, SHARES_PER_CONTRACT};
pub use state::Portfolio;
pub use valuation::{PriceMap, ValuationBreakdown};

//! Closed-form option pricing.
//!
//! European Black-Scholes valuation used for premiums at open time and for
//! daily mark-to-market of open contracts.

pub mod black_scholes;

pub use black_scholes::{intrinsic_value, price, price_call, price_put, BlackScholes};

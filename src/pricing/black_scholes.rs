//! Black-Scholes pricing for European calls and puts.
//!
//! Inputs follow the usual convention: spot `S`, strike `K`, annualized
//! volatility `sigma`, continuously compounded risk-free rate `r` and time to
//! expiry `t` in years. Degenerate inputs (any of `S`, `K`, `sigma`, `t` not
//! strictly positive) price to 0.0 instead of producing NaN or infinities, so
//! callers can value positions even when volatility history is missing.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::data::OptionType;

/// Standard normal CDF.
fn norm_cdf(x: f64) -> f64 {
    Normal::standard().cdf(x)
}

fn is_degenerate(spot: f64, strike: f64, sigma: f64, time: f64) -> bool {
    !(spot.is_finite() && strike.is_finite() && sigma.is_finite() && time.is_finite())
        || spot <= 0.0
        || strike <= 0.0
        || sigma <= 0.0
        || time <= 0.0
}

fn d1_d2(spot: f64, strike: f64, sigma: f64, rate: f64, time: f64) -> (f64, f64) {
    let vol_sqrt_t = sigma * time.sqrt();
    let d1 = ((spot / strike).ln() + (rate + 0.5 * sigma * sigma) * time) / vol_sqrt_t;
    (d1, d1 - vol_sqrt_t)
}

/// Price a European call.
pub fn price_call(spot: f64, strike: f64, sigma: f64, rate: f64, time: f64) -> f64 {
    if is_degenerate(spot, strike, sigma, time) {
        return 0.0;
    }

    let (d1, d2) = d1_d2(spot, strike, sigma, rate, time);
    spot * norm_cdf(d1) - strike * (-rate * time).exp() * norm_cdf(d2)
}

/// Price a European put.
pub fn price_put(spot: f64, strike: f64, sigma: f64, rate: f64, time: f64) -> f64 {
    if is_degenerate(spot, strike, sigma, time) {
        return 0.0;
    }

    let (d1, d2) = d1_d2(spot, strike, sigma, rate, time);
    strike * (-rate * time).exp() * norm_cdf(-d2) - spot * norm_cdf(-d1)
}

/// Price an option based on type.
pub fn price(
    option_type: OptionType,
    spot: f64,
    strike: f64,
    sigma: f64,
    rate: f64,
    time: f64,
) -> f64 {
    match option_type {
        OptionType::Call => price_call(spot, strike, sigma, rate, time),
        OptionType::Put => price_put(spot, strike, sigma, rate, time),
    }
}

/// In-the-money amount per share, ignoring time value.
pub fn intrinsic_value(option_type: OptionType, spot: f64, strike: f64) -> f64 {
    match option_type {
        OptionType::Call => (spot - strike).max(0.0),
        OptionType::Put => (strike - spot).max(0.0),
    }
}

/// Pricer bound to a fixed risk-free rate.
///
/// Strategies hold one of these so every premium they quote for the run uses
/// the same rate.
#[derive(Debug, Clone, Copy)]
pub struct BlackScholes {
    /// Risk-free interest rate
    pub rate: f64,
}

impl Default for BlackScholes {
    fn default() -> Self {
        Self { rate: 0.05 }
    }
}

impl BlackScholes {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    /// Premium per share for `days` calendar days to expiry.
    pub fn premium(
        &self,
        option_type: OptionType,
        spot: f64,
        strike: f64,
        sigma: f64,
        days: i64,
    ) -> f64 {
        price(option_type, spot, strike, sigma, self.rate, days as f64 / 365.0)
    }

    pub fn call_price(&self, spot: f64, strike: f64, sigma: f64, time: f64) -> f64 {
        price_call(spot, strike, sigma, self.rate, time)
    }

    pub fn put_price(&self, spot: f64, strike: f64, sigma: f64, time: f64) -> f64 {
        price_put(spot, strike, sigma, self.rate, time)
    }
}

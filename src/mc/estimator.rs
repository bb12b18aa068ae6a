// src/mc/estimator.rs
//! Monte Carlo estimators on sampled terminal prices
//!
//! # NaN Masking
//!
//! A sample whose price is NaN contributes nothing to the payoff sum and is
//! excluded from the count:
//! ```text
//! V ≈ DF · Σ_{i: S_i finite} payoff(S_i) / #{i: S_i finite}
//! ```
//! with the ratio defined as 0 when no sample survives.

use super::payoffs::Payoff;
use crate::analytics::bs_analytic;
use crate::error::SdeResult;
use crate::math_utils::divide_no_nan;
use ndarray::ArrayView1;

/// Discounted European option price estimate from terminal prices
pub fn mc_option_price(
    prices: ArrayView1<f64>,
    strike: f64,
    discount_factor: f64,
    is_call: bool,
) -> f64 {
    let payoff = Payoff::european(strike, is_call);
    let (sum, count) = prices
        .iter()
        .filter(|p| !p.is_nan())
        .fold((0.0, 0usize), |(sum, count), &p| (sum + payoff.calculate(p), count + 1));

    if count == 0 && !prices.is_empty() {
        tracing::warn!(samples = prices.len(), strike, "all sampled prices are NaN");
    }
    discount_factor * divide_no_nan(sum, count as f64)
}

/// Black-Scholes implied vol of the Monte Carlo call price at `strike`
pub fn implied_vol_from_paths(
    time: f64,
    strike: f64,
    prices: ArrayView1<f64>,
    spot: f64,
    discount_factor: f64,
    dividend_rate: f64,
) -> SdeResult<f64> {
    let price = mc_option_price(prices, strike, discount_factor, true);
    bs_analytic::implied_vol(price, strike, time, spot, discount_factor, dividend_rate, true)
}

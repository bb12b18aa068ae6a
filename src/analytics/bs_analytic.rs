// src/analytics/bs_analytic.rs
//! Black-Scholes prices and implied volatility with dividends and term rates
//!
//! # Mathematical Foundation
//!
//! With discount factor `DF = exp(-∫₀ᵀ r)` and continuous dividend yield `q`,
//! the forward is `F = S e^{-qT} / DF` and
//! ```text
//! C = DF (F Φ(d₁) - K Φ(d₂))
//! P = DF (K Φ(-d₂) - F Φ(-d₁))
//!
//! d₁ = [ln(F/K) + σ²T/2] / (σ√T)
//! d₂ = d₁ - σ√T
//! ```
//!
//! Implied volatility inverts the undiscounted Black price with the
//! rational approximation of the `implied-vol` crate.

use crate::error::{validation::*, SdeError, SdeResult};
use crate::math_utils::{norm_cdf, norm_pdf};
use implied_vol::{DefaultSpecialFn, ImpliedBlackVolatility};

fn forward(spot: f64, expiry: f64, discount_factor: f64, dividend_rate: f64) -> f64 {
    spot * (-dividend_rate * expiry).exp() / discount_factor
}

/// Black-Scholes European option price
///
/// # Parameters
/// - `vol`: Volatility
/// - `strike`: Strike price
/// - `expiry`: Time to expiration in years
/// - `spot`: Current price of the underlying
/// - `discount_factor`: Discount factor to `expiry`
/// - `dividend_rate`: Continuous dividend yield
/// - `is_call`: Call if true, put otherwise
pub fn option_price(
    vol: f64,
    strike: f64,
    expiry: f64,
    spot: f64,
    discount_factor: f64,
    dividend_rate: f64,
    is_call: bool,
) -> f64 {
    let f = forward(spot, expiry, discount_factor, dividend_rate);
    let sd = vol * expiry.sqrt();
    if sd <= 0.0 {
        let intrinsic = if is_call { f - strike } else { strike - f };
        return discount_factor * intrinsic.max(0.0);
    }
    let d1 = ((f / strike).ln() + 0.5 * sd * sd) / sd;
    let d2 = d1 - sd;
    if is_call {
        discount_factor * (f * norm_cdf(d1) - strike * norm_cdf(d2))
    } else {
        discount_factor * (strike * norm_cdf(-d2) - f * norm_cdf(-d1))
    }
}

/// Black-Scholes European call with flat rate `r` and no dividends
pub fn bs_call_price(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    option_price(sigma, k, t, s, (-r * t).exp(), 0.0, true)
}

/// Vega (∂V/∂σ), identical for calls and puts
///
/// ```text
/// ν = DF F φ(d₁) √T
/// ```
pub fn vega(
    vol: f64,
    strike: f64,
    expiry: f64,
    spot: f64,
    discount_factor: f64,
    dividend_rate: f64,
) -> f64 {
    let f = forward(spot, expiry, discount_factor, dividend_rate);
    let sd = vol * expiry.sqrt();
    if sd <= 0.0 {
        return 0.0;
    }
    let d1 = ((f / strike).ln() + 0.5 * sd * sd) / sd;
    discount_factor * f * norm_pdf(d1) * expiry.sqrt()
}

/// Volatility that reproduces `price` under Black-Scholes
///
/// Fails with [`SdeError::NumericalInstability`] when the price lies outside
/// the no-arbitrage bounds or the inversion does not produce a finite vol.
pub fn implied_vol(
    price: f64,
    strike: f64,
    expiry: f64,
    spot: f64,
    discount_factor: f64,
    dividend_rate: f64,
    is_call: bool,
) -> SdeResult<f64> {
    validate_finite("price", price)?;
    validate_positive("strike", strike)?;
    validate_positive("expiry", expiry)?;
    validate_positive("spot", spot)?;
    validate_positive("discount_factor", discount_factor)?;
    validate_finite("dividend_rate", dividend_rate)?;

    let f = forward(spot, expiry, discount_factor, dividend_rate);
    let undiscounted = price / discount_factor;
    let (lower, upper) = if is_call {
        ((f - strike).max(0.0), f)
    } else {
        ((strike - f).max(0.0), strike)
    };
    if undiscounted <= lower || undiscounted >= upper {
        return Err(SdeError::NumericalInstability {
            method: "implied_vol".to_string(),
            reason: format!(
                "price {} outside no-arbitrage bounds ({}, {}) for strike {}",
                undiscounted, lower, upper, strike
            ),
        });
    }

    let vol = ImpliedBlackVolatility::builder()
        .option_price(undiscounted)
        .forward(f)
        .strike(strike)
        .expiry(expiry)
        .is_call(is_call)
        .build_unchecked()
        .calculate::<DefaultSpecialFn>();

    match vol {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(SdeError::NumericalInstability {
            method: "implied_vol".to_string(),
            reason: format!("inversion failed for price {} at strike {}", price, strike),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_call_matches_reference_value() {
        // S=100, K=100, r=5%, σ=20%, T=1
        assert_relative_eq!(
            bs_call_price(100.0, 100.0, 0.05, 0.2, 1.0),
            10.450583572185565,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_put_call_parity() {
        let (s, k, t, df, q) = (1.0, 1.1, 2.0, 0.9, 0.01);
        let c = option_price(0.15, k, t, s, df, q, true);
        let p = option_price(0.15, k, t, s, df, q, false);
        assert_relative_eq!(c - p, s * (-q * t).exp() - k * df, epsilon = 1e-12);
    }

    #[test]
    fn test_implied_vol_round_trip() {
        for (k, vol) in [(0.9, 0.13), (1.0, 0.1), (1.1, 0.11)] {
            let price = option_price(vol, k, 2.0, 1.0, (-0.1f64).exp(), 0.0, true);
            let iv = implied_vol(price, k, 2.0, 1.0, (-0.1f64).exp(), 0.0, true).unwrap();
            assert_relative_eq!(iv, vol, max_relative = 1e-8);
        }
    }

    #[test]
    fn test_implied_vol_rejects_arbitrage() {
        // Call below intrinsic
        assert!(implied_vol(0.05, 0.9, 1.0, 1.0, 1.0, 0.0, true).is_err());
        // Call above forward
        assert!(implied_vol(1.5, 0.9, 1.0, 1.0, 1.0, 0.0, true).is_err());
        assert!(implied_vol(f64::NAN, 0.9, 1.0, 1.0, 1.0, 0.0, true).is_err());
    }

    #[test]
    fn test_vega_matches_finite_difference() {
        let h = 1e-5;
        let up = option_price(0.2 + h, 1.0, 1.0, 1.0, 0.97, 0.0, true);
        let down = option_price(0.2 - h, 1.0, 1.0, 1.0, 0.97, 0.0, true);
        assert_relative_eq!(
            vega(0.2, 1.0, 1.0, 1.0, 0.97, 0.0),
            (up - down) / (2.0 * h),
            max_relative = 1e-6
        );
    }
}

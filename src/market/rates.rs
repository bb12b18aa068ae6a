// src/market/rates.rs
//! Risk-free rate curves
//!
//! Rates are continuously compounded. A piecewise-constant curve holds
//! `rates[i]` on `[jump_times[i-1], jump_times[i])`, with `rates.len() ==
//! jump_times.len() + 1`; the last rate extends to infinity.

use crate::error::{validation::*, SdeError, SdeResult};

#[derive(Debug, Clone, PartialEq)]
pub enum RateCurve {
    Flat(f64),
    PiecewiseConstant { jump_times: Vec<f64>, rates: Vec<f64> },
}

impl RateCurve {
    pub fn flat(rate: f64) -> Self {
        RateCurve::Flat(rate)
    }

    pub fn piecewise_constant(jump_times: Vec<f64>, rates: Vec<f64>) -> SdeResult<Self> {
        validate_strictly_increasing("jump_times", &jump_times)?;
        if rates.len() != jump_times.len() + 1 {
            return Err(SdeError::InvalidConfiguration {
                field: "rates".to_string(),
                reason: format!(
                    "expected {} rates for {} jump times, got {}",
                    jump_times.len() + 1,
                    jump_times.len(),
                    rates.len()
                ),
            });
        }
        for &r in &rates {
            validate_finite("rate", r)?;
        }
        Ok(RateCurve::PiecewiseConstant { jump_times, rates })
    }

    pub fn validate(&self) -> SdeResult<()> {
        match self {
            RateCurve::Flat(r) => validate_finite("risk_free_rate", *r),
            RateCurve::PiecewiseConstant { jump_times, rates } => {
                Self::piecewise_constant(jump_times.clone(), rates.clone()).map(|_| ())
            }
        }
    }

    /// Instantaneous short rate at `t`
    pub fn rate(&self, t: f64) -> f64 {
        match self {
            RateCurve::Flat(r) => *r,
            RateCurve::PiecewiseConstant { jump_times, rates } => {
                rates[jump_times.partition_point(|&j| j <= t)]
            }
        }
    }

    /// `∫_0^t r(s) ds`
    pub fn integrated_rate(&self, t: f64) -> f64 {
        match self {
            RateCurve::Flat(r) => r * t,
            RateCurve::PiecewiseConstant { jump_times, rates } => {
                let mut total = 0.0;
                let mut start = 0.0;
                for (i, &jump) in jump_times.iter().enumerate() {
                    if t <= jump {
                        return total + rates[i] * (t - start).max(0.0);
                    }
                    total += rates[i] * (jump - start).max(0.0);
                    start = jump.max(0.0);
                }
                total + rates[jump_times.len()] * (t - start).max(0.0)
            }
        }
    }

    /// `exp(-∫_0^t r(s) ds)`
    pub fn discount_factor(&self, t: f64) -> f64 {
        (-self.integrated_rate(t)).exp()
    }
}

impl Default for RateCurve {
    fn default() -> Self {
        RateCurve::Flat(0.0)
    }
}

// src/smile.rs
//! Smile round-trip checks
//!
//! Simulated terminal prices are turned back into Black-Scholes implied
//! volatilities and compared with the quotes the model was calibrated to.
//! A point passes when
//! ```text
//! |σ_sim - σ_quote| <= atol + rtol · |σ_quote|
//! ```

use crate::error::{validation::*, SdeError, SdeResult};
use crate::market::RateCurve;
use crate::mc::estimator::implied_vol_from_paths;
use crate::scenario::MarketScenario;
use ndarray::{s, ArrayView3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmileTolerance {
    pub atol: f64,
    pub rtol: f64,
}

impl SmileTolerance {
    pub fn validate(&self) -> SdeResult<()> {
        validate_non_negative("atol", self.atol)?;
        validate_non_negative("rtol", self.rtol)?;
        Ok(())
    }

    pub fn is_close(&self, simulated: f64, expected: f64) -> bool {
        (simulated - expected).abs() <= self.atol + self.rtol * expected.abs()
    }
}

impl Default for SmileTolerance {
    fn default() -> Self {
        SmileTolerance {
            atol: 0.005,
            rtol: 0.005,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmilePoint {
    pub dim: usize,
    pub expiry_index: usize,
    pub strike_index: usize,
    pub strike: f64,
    pub expected: f64,
    /// NaN when the Monte Carlo price could not be inverted
    pub simulated: f64,
    pub passed: bool,
}

impl SmilePoint {
    pub fn error(&self) -> f64 {
        self.simulated - self.expected
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SmileReport {
    pub points: Vec<SmilePoint>,
}

impl SmileReport {
    pub fn mismatches(&self) -> impl Iterator<Item = &SmilePoint> {
        self.points.iter().filter(|p| !p.passed)
    }

    pub fn is_success(&self) -> bool {
        self.points.iter().all(|p| p.passed)
    }

    /// Largest absolute deviation over the points that could be inverted
    pub fn max_abs_error(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.error().abs())
            .filter(|e| e.is_finite())
            .fold(0.0, f64::max)
    }

    pub fn into_result(self) -> SdeResult<Self> {
        let mismatch = self.mismatches().next().map(|p| SdeError::SmileMismatch {
            dim: p.dim,
            expiry_index: p.expiry_index,
            strike: p.strike,
            expected: p.expected,
            simulated: p.simulated,
        });
        match mismatch {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// Compare the smile implied by `paths` with the quotes in `scenario`
///
/// `paths` is `[num_samples, n_expiries, dim]`, sampled at the scenario's
/// expiry times; time index `i` is priced as expiry `i`.
pub fn reconstruct_smile(
    paths: ArrayView3<f64>,
    scenario: &MarketScenario,
    rate_curve: &RateCurve,
    strike_indices: &[usize],
    tolerance: SmileTolerance,
) -> SdeResult<SmileReport> {
    tolerance.validate()?;
    let (_, num_times, dim) = paths.dim();
    validate_len("path dimensions", dim, scenario.dim())?;
    validate_len("path times", num_times, scenario.num_expiries())?;
    let n_strikes = scenario.strikes.shape()[2];
    if let Some(&bad) = strike_indices.iter().find(|&&j| j >= n_strikes) {
        return Err(SdeError::InvalidConfiguration {
            field: "strike_indices".to_string(),
            reason: format!("index {} out of range for {} strikes", bad, n_strikes),
        });
    }

    let mut points = Vec::with_capacity(dim * num_times * strike_indices.len());
    for d in 0..dim {
        for i in 0..num_times {
            let time = scenario.expiry_times[[d, i]];
            let discount_factor = rate_curve.discount_factor(time);
            let terminal = paths.slice(s![.., i, d]);
            for &j in strike_indices {
                let strike = scenario.strikes[[d, i, j]];
                let expected = scenario.implied_vols[[d, i, j]];
                let simulated = implied_vol_from_paths(
                    time,
                    strike,
                    terminal,
                    scenario.spot[d],
                    discount_factor,
                    0.0,
                )
                .unwrap_or(f64::NAN);
                let passed = tolerance.is_close(simulated, expected);
                if !passed {
                    tracing::warn!(
                        dim = d,
                        expiry_index = i,
                        strike,
                        expected,
                        simulated,
                        "smile point outside tolerance"
                    );
                }
                points.push(SmilePoint {
                    dim: d,
                    expiry_index: i,
                    strike_index: j,
                    strike,
                    expected,
                    simulated,
                    passed,
                });
            }
        }
    }
    Ok(SmileReport { points })
}

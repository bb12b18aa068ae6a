// src/models/gbm.rs
use super::model::SdeModel;
use crate::error::{validation::*, SdeResult};
use crate::mc::config::ExecutionMode;
use ndarray::{Array2, ArrayView2};

/// Independent geometric Brownian motions sharing `mu` and `sigma`
///
/// In log-space the coefficients are constant, so the sampler's step reduces
/// to the exact solution and can be checked against Black-Scholes.
#[derive(Debug, Clone)]
pub struct Gbm {
    pub dim: usize,
    pub mu: f64,
    pub sigma: f64,
}

impl Gbm {
    pub fn new(dim: usize, mu: f64, sigma: f64) -> SdeResult<Self> {
        validate_finite("mu", mu)?;
        validate_positive("sigma", sigma)?;
        Ok(Gbm { dim, mu, sigma })
    }

    pub fn exact_step(&self, s_t: f64, dt: f64, normal_draw: f64) -> f64 {
        let drift = (self.mu - 0.5 * self.sigma * self.sigma) * dt;
        s_t * (drift + self.sigma * dt.sqrt() * normal_draw).exp()
    }
}

impl SdeModel for Gbm {
    fn dim(&self) -> usize {
        self.dim
    }

    fn log_coefficients(
        &self,
        _t: f64,
        prices: ArrayView2<f64>,
        _execution: ExecutionMode,
    ) -> SdeResult<(Array2<f64>, Array2<f64>)> {
        validate_len("price columns", prices.ncols(), self.dim)?;
        let drift = Array2::from_elem(prices.raw_dim(), self.mu - 0.5 * self.sigma * self.sigma);
        let vol = Array2::from_elem(prices.raw_dim(), self.sigma);
        Ok((drift, vol))
    }
}

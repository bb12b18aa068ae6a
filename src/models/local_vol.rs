// src/models/local_vol.rs
//! Local Volatility Model
//!
//! # Mathematical Framework
//!
//! Each underlying follows
//! ```text
//! dS_d = (r(t) - q_d) S_d dt + σ_loc,d(t, S_d) S_d dW_d
//! ```
//! where the local volatility is fixed by Dupire's relation so that the
//! model reprices every vanilla on the implied volatility surface. Written
//! in terms of the implied vol `σ(T, K)` and its partial derivatives:
//! ```text
//! σ_loc² = (σ² + 2σT(∂_Tσ + (r - q) K ∂_Kσ))
//!        / ((1 + K x ∂_Kσ)² + K² T σ (∂_KKσ - x (∂_Kσ)²))
//!
//! x = d₁√T = (ln(S₀/K) + ∫₀ᵀ r - qT + σ²T/2) / σ
//! ```
//! evaluated at `T = t`, `K = S_d`. Derivatives are central finite
//! differences of the surface (one-sided in time near `t = 0`), so any
//! [`VolatilityFn`] can drive the model.
//!
//! # Numerical Guards
//!
//! - A negative local variance is clipped to zero
//! - A non-positive denominator, or a non-finite result, falls back to the
//!   implied variance `σ²`

use super::model::SdeModel;
use crate::error::{validation::*, SdeError, SdeResult};
use crate::market::{RateCurve, VolatilityFn, VolatilitySurface};
use crate::math_utils::Timer;
use crate::mc::config::{ExecutionMode, SamplingConfig};
use crate::solvers::euler_maruyama::EulerMaruyama;
use chrono::NaiveDate;
use nalgebra::DMatrix;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Zip};
use std::sync::Arc;

/// Relative strike bump for the strike derivatives
const STRIKE_BUMP: f64 = 1e-4;
/// Absolute time bump (years) for the time derivative
const TIME_BUMP: f64 = 1e-4;

pub struct LocalVolatilityModel {
    dim: usize,
    initial_spot: Vec<f64>,
    surface: Arc<dyn VolatilityFn>,
    rate_curve: RateCurve,
    dividend_yield: Vec<f64>,
    correlation_factor: Option<Array2<f64>>,
}

impl LocalVolatilityModel {
    /// Build the model from raw market quotes
    ///
    /// `expiries` is `[dim][n_expiries]`; `strikes` and `implied_vols` are
    /// `[dim, n_expiries, n_strikes]`. The quotes are interpolated with
    /// [`VolatilitySurface::new`].
    #[allow(clippy::too_many_arguments)]
    pub fn from_market_data(
        dim: usize,
        valuation_date: NaiveDate,
        expiries: Vec<Vec<NaiveDate>>,
        strikes: ArrayView3<f64>,
        implied_vols: ArrayView3<f64>,
        spot: &[f64],
        rate_curve: RateCurve,
        dividend_yield: &[f64],
    ) -> SdeResult<Self> {
        let surface = VolatilitySurface::new(valuation_date, expiries, strikes, implied_vols)?;
        Self::from_volatility_surface(dim, spot, surface, rate_curve, dividend_yield)
    }

    /// Build the model from any implied volatility surface
    pub fn from_volatility_surface<V: VolatilityFn + 'static>(
        dim: usize,
        spot: &[f64],
        surface: V,
        rate_curve: RateCurve,
        dividend_yield: &[f64],
    ) -> SdeResult<Self> {
        Self::from_shared_surface(dim, spot, Arc::new(surface), rate_curve, dividend_yield)
    }

    /// Build the model around a surface shared with other models
    pub fn from_shared_surface(
        dim: usize,
        spot: &[f64],
        surface: Arc<dyn VolatilityFn>,
        rate_curve: RateCurve,
        dividend_yield: &[f64],
    ) -> SdeResult<Self> {
        if dim == 0 {
            return Err(SdeError::InvalidConfiguration {
                field: "dim".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        validate_len("surface dimension", surface.dim(), dim)?;
        validate_len("spot", spot.len(), dim)?;
        for &s in spot {
            validate_positive("spot", s)?;
        }
        rate_curve.validate()?;

        let dividend_yield = match dividend_yield.len() {
            1 => vec![dividend_yield[0]; dim],
            n if n == dim => dividend_yield.to_vec(),
            n => {
                return Err(SdeError::InvalidConfiguration {
                    field: "dividend_yield".to_string(),
                    reason: format!("expected 1 or {} entries, got {}", dim, n),
                })
            }
        };
        for &q in &dividend_yield {
            validate_finite("dividend_yield", q)?;
        }

        tracing::debug!(dim, ?rate_curve, ?dividend_yield, "built local volatility model");

        Ok(LocalVolatilityModel {
            dim,
            initial_spot: spot.to_vec(),
            surface,
            rate_curve,
            dividend_yield,
            correlation_factor: None,
        })
    }

    /// Correlate the Brownian drivers; `correlation` must be positive definite
    pub fn with_correlation(mut self, correlation: DMatrix<f64>) -> SdeResult<Self> {
        validate_correlation_matrix(&correlation)?;
        validate_len("correlation", correlation.nrows(), self.dim)?;
        let cholesky = correlation
            .cholesky()
            .ok_or_else(|| SdeError::InvalidConfiguration {
                field: "correlation".to_string(),
                reason: "matrix is not positive definite".to_string(),
            })?;
        let l = cholesky.l();
        self.correlation_factor = Some(Array2::from_shape_fn((self.dim, self.dim), |(i, j)| {
            l[(i, j)]
        }));
        Ok(self)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn initial_spot(&self) -> &[f64] {
        &self.initial_spot
    }

    pub fn rate_curve(&self) -> &RateCurve {
        &self.rate_curve
    }

    pub fn dividend_yield(&self) -> &[f64] {
        &self.dividend_yield
    }

    pub fn surface(&self) -> &Arc<dyn VolatilityFn> {
        &self.surface
    }

    /// Dupire local volatility for `prices` of shape `[num_points, dim]` at `t`
    pub fn local_volatility(
        &self,
        t: f64,
        prices: ArrayView2<f64>,
        execution: ExecutionMode,
    ) -> SdeResult<Array2<f64>> {
        validate_non_negative("t", t)?;
        validate_len("price columns", prices.ncols(), self.dim)?;

        let bump = prices.mapv(|k| STRIKE_BUMP * k.abs());
        let up = &prices + &bump;
        let down = &prices - &bump;
        let width = &up - &down;

        let sigma = self.surface.volatility(t, prices)?;
        let sigma_up = self.surface.volatility(t, up.view())?;
        let sigma_down = self.surface.volatility(t, down.view())?;
        let sigma_k = (&sigma_up - &sigma_down) / &width;
        let half_width = &width * 0.5;
        let sigma_kk =
            (&sigma_up - &(&sigma * 2.0) + &sigma_down) / &(&half_width * &half_width);

        let (t_up, t_down) = if t > TIME_BUMP {
            (t + TIME_BUMP, t - TIME_BUMP)
        } else {
            (t + TIME_BUMP, t)
        };
        let sigma_t = (self.surface.volatility(t_up, prices)?
            - self.surface.volatility(t_down, prices)?)
            / (t_up - t_down);

        let r = self.rate_curve.rate(t);
        let integrated_r = self.rate_curve.integrated_rate(t);

        let mut local_vol = Array2::<f64>::zeros(prices.raw_dim());
        for d in 0..self.dim {
            let s0 = self.initial_spot[d];
            let q = self.dividend_yield[d];
            let dupire = |lv: &mut f64, &k: &f64, &s: &f64, &s_t: &f64, &s_k: &f64, &s_kk: &f64| {
                *lv = dupire_local_variance(DupireInputs {
                    strike: k,
                    initial_spot: s0,
                    t,
                    sigma: s,
                    sigma_t: s_t,
                    sigma_k: s_k,
                    sigma_kk: s_kk,
                    rate: r,
                    integrated_rate: integrated_r,
                    dividend_yield: q,
                })
                .sqrt()
            };
            let zip = Zip::from(local_vol.column_mut(d))
                .and(prices.column(d))
                .and(sigma.column(d))
                .and(sigma_t.column(d))
                .and(sigma_k.column(d))
                .and(sigma_kk.column(d));
            match execution {
                ExecutionMode::Sequential => zip.for_each(dupire),
                ExecutionMode::Parallel => zip.par_for_each(dupire),
            }
        }
        tracing::trace!(
            t,
            clipped = local_vol.iter().filter(|&&v| v == 0.0).count(),
            "evaluated local volatility"
        );
        Ok(local_vol)
    }

    /// Simulate `[num_samples, times.len(), dim]` prices under the model
    pub fn sample_paths(
        &self,
        initial_state: &[f64],
        cfg: &SamplingConfig,
    ) -> SdeResult<Array3<f64>> {
        let timer = Timer::new();
        let paths = EulerMaruyama::sample_paths(self, initial_state, cfg)?;
        tracing::info!(
            dim = self.dim,
            num_samples = cfg.num_samples,
            num_time_steps = cfg.num_time_steps,
            random_type = ?cfg.random_type,
            execution = ?cfg.execution,
            elapsed_ms = timer.elapsed_ms(),
            "sampled local volatility paths"
        );
        Ok(paths)
    }
}

impl SdeModel for LocalVolatilityModel {
    fn dim(&self) -> usize {
        self.dim
    }

    fn log_coefficients(
        &self,
        t: f64,
        prices: ArrayView2<f64>,
        execution: ExecutionMode,
    ) -> SdeResult<(Array2<f64>, Array2<f64>)> {
        let vol = self.local_volatility(t, prices, execution)?;
        let r = self.rate_curve.rate(t);
        let mut drift = Array2::<f64>::zeros(vol.raw_dim());
        for (d, mut column) in drift.columns_mut().into_iter().enumerate() {
            let carry = r - self.dividend_yield[d];
            Zip::from(&mut column)
                .and(vol.column(d))
                .for_each(|mu, &sigma| *mu = carry - 0.5 * sigma * sigma);
        }
        Ok((drift, vol))
    }

    fn correlation_factor(&self) -> Option<&Array2<f64>> {
        self.correlation_factor.as_ref()
    }
}

impl std::fmt::Debug for LocalVolatilityModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalVolatilityModel")
            .field("dim", &self.dim)
            .field("initial_spot", &self.initial_spot)
            .field("rate_curve", &self.rate_curve)
            .field("dividend_yield", &self.dividend_yield)
            .field("correlated", &self.correlation_factor.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy)]
struct DupireInputs {
    strike: f64,
    initial_spot: f64,
    t: f64,
    sigma: f64,
    sigma_t: f64,
    sigma_k: f64,
    sigma_kk: f64,
    rate: f64,
    integrated_rate: f64,
    dividend_yield: f64,
}

fn dupire_local_variance(p: DupireInputs) -> f64 {
    let DupireInputs {
        strike: k,
        initial_spot: s0,
        t,
        sigma,
        sigma_t,
        sigma_k,
        sigma_kk,
        rate: r,
        integrated_rate,
        dividend_yield: q,
    } = p;
    let implied_variance = sigma * sigma;

    let x = ((s0 / k).ln() + integrated_rate - q * t + 0.5 * implied_variance * t) / sigma;
    let numerator = implied_variance + 2.0 * sigma * t * (sigma_t + (r - q) * k * sigma_k);
    let skew = 1.0 + k * x * sigma_k;
    let denominator = skew * skew + k * k * t * sigma * (sigma_kk - x * sigma_k * sigma_k);

    if !(denominator > 0.0) {
        return implied_variance;
    }
    let local_variance = numerator / denominator;
    if local_variance.is_finite() {
        local_variance.max(0.0)
    } else {
        implied_variance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::FlatVolatility;
    use crate::scenario::MarketScenario;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn smile_model(dim: usize, rate: f64) -> LocalVolatilityModel {
        let s = MarketScenario::smile_test(dim).unwrap();
        LocalVolatilityModel::from_market_data(
            dim,
            s.valuation_date,
            s.expiries.clone(),
            s.strikes.view(),
            s.implied_vols.view(),
            &s.spot,
            RateCurve::flat(rate),
            &[0.0],
        )
        .unwrap()
    }

    #[test]
    fn test_flat_surface_local_vol_equals_implied() {
        let model = LocalVolatilityModel::from_volatility_surface(
            2,
            &[1.0, 2.0],
            FlatVolatility { dim: 2, sigma: 0.2 },
            RateCurve::flat(0.03),
            &[0.01],
        )
        .unwrap();
        let prices = array![[0.8, 1.5], [1.0, 2.0], [1.3, 2.4]];
        for t in [0.0, 0.5, 2.0] {
            let lv = model
                .local_volatility(t, prices.view(), ExecutionMode::Sequential)
                .unwrap();
            for &v in lv.iter() {
                assert_relative_eq!(v, 0.2, max_relative = 1e-8);
            }
        }
    }

    #[test]
    fn test_atm_local_vol_at_time_zero_equals_implied() {
        // At t = 0 and K = S0 the Dupire ratio reduces to σ².
        let model = smile_model(1, 0.0);
        let lv = model
            .local_volatility(0.0, array![[1.0]].view(), ExecutionMode::Sequential)
            .unwrap();
        assert_relative_eq!(lv[[0, 0]], 0.1, max_relative = 1e-6);
    }

    #[test]
    fn test_smile_local_vol_is_finite_and_positive() {
        let model = smile_model(2, 0.05);
        let prices = array![[0.5, 0.7], [0.95, 1.0], [1.05, 1.2], [2.0, 4.0]];
        for t in [0.0, 0.3, 1.0, 1.9, 2.5] {
            let lv = model
                .local_volatility(t, prices.view(), ExecutionMode::Sequential)
                .unwrap();
            assert!(lv.iter().all(|v| v.is_finite() && *v >= 0.0), "t = {t}: {lv:?}");
        }
    }

    #[test]
    fn test_local_vol_is_mode_independent() {
        let model = smile_model(2, 0.05);
        let prices =
            Array2::from_shape_fn((64, 2), |(i, d)| 0.6 + 0.01 * i as f64 + 0.1 * d as f64);
        let seq = model
            .local_volatility(0.7, prices.view(), ExecutionMode::Sequential)
            .unwrap();
        let par = model
            .local_volatility(0.7, prices.view(), ExecutionMode::Parallel)
            .unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn test_dividend_yield_broadcast() {
        let model = smile_model(3, 0.0);
        assert_eq!(model.dividend_yield(), &[0.0, 0.0, 0.0]);

        let s = MarketScenario::smile_test(2).unwrap();
        let err = LocalVolatilityModel::from_market_data(
            2,
            s.valuation_date,
            s.expiries.clone(),
            s.strikes.view(),
            s.implied_vols.view(),
            &s.spot,
            RateCurve::flat(0.0),
            &[0.0, 0.0, 0.0],
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let result = LocalVolatilityModel::from_volatility_surface(
            2,
            &[1.0, 1.0],
            FlatVolatility { dim: 1, sigma: 0.2 },
            RateCurve::flat(0.0),
            &[0.0],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_correlation_must_be_positive_definite() {
        let model = smile_model(2, 0.0);
        let singular = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        assert!(model.with_correlation(singular).is_err());

        let model = smile_model(2, 0.0);
        let rho = DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.5, 1.0]);
        let model = model.with_correlation(rho).unwrap();
        let l = model.correlation_factor().unwrap();
        assert_relative_eq!(l[[1, 0]], 0.5, epsilon = 1e-12);
        assert_relative_eq!(l[[1, 1]], 0.75f64.sqrt(), epsilon = 1e-12);
    }
}

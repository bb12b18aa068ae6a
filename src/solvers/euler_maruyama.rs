// src/solvers/euler_maruyama.rs
//! Weak Second-Order Scheme for Log-Price SDEs
//!
//! # Mathematical Framework
//!
//! For a diffusion on `X = ln S`:
//! ```text
//! dX_t = μ(t, S_t) dt + σ(t, S_t) dW_t
//! ```
//!
//! each component advances with Platen's explicit weak order 2.0 step
//! (Kloeden and Platen, eq. 15.1.1), using support values
//! ```text
//! Υ  = X_n + μ Δt + σ ΔW
//! Υ± = X_n + μ Δt ± σ √Δt
//! ```
//! and the update
//! ```text
//! X_{n+1} = X_n + ½ (μ(t_{n+1}, Υ) + μ) Δt
//!               + ¼ (σ(t_{n+1}, Υ+) + σ(t_{n+1}, Υ-) + 2σ) ΔW
//!               + ¼ (σ(t_{n+1}, Υ+) - σ(t_{n+1}, Υ-)) (ΔW² - Δt) / √Δt
//! ```
//!
//! Where:
//! - `μ`, `σ` without arguments are evaluated at `(t_n, S_n)`
//! - `ΔW = √Δt (L Z_n)` with `Z_n ~ N(0, I)` from a [`NormalSampler`]
//! - `L` is the Cholesky factor of the driver correlation (identity if absent)
//!
//! Component `d` of the coefficients may depend on `S_d` only, which holds
//! for every [`SdeModel`] in this crate.
//!
//! # Time Grid
//!
//! `num_time_steps` uniform intervals over `[0, max(times)]`, merged with the
//! requested `times` so that every sampling time is hit exactly.
//!
//! # Convergence Properties
//!
//! - **Weak convergence**: Order 2.0 in step size, at four coefficient
//!   evaluations per step
//! - Reduces to the exact log-Euler step for constant coefficients
//!   (geometric Brownian motion)

use crate::error::{validation::*, SdeError, SdeResult};
use crate::mc::config::{ExecutionMode, SamplingConfig};
use crate::models::model::SdeModel;
use crate::rng::NormalSampler;
use ndarray::{par_azip, s, Array2, Array3, Zip};

/// Points closer than this are treated as the same grid time
const GRID_TOLERANCE: f64 = 1e-10;

/// Weak order 2.0 scheme for log-price SDE integration
pub struct EulerMaruyama;

impl EulerMaruyama {
    /// Merged simulation grid and, for each entry of `times`, its index in the grid
    pub fn time_grid(times: &[f64], num_time_steps: usize) -> SdeResult<(Vec<f64>, Vec<usize>)> {
        let t_max = match times.last() {
            Some(&t) => t,
            None => {
                return Err(SdeError::InvalidConfiguration {
                    field: "times".to_string(),
                    reason: "need at least one sampling time".to_string(),
                })
            }
        };
        validate_steps(num_time_steps)?;

        let mut grid: Vec<f64> = (0..=num_time_steps)
            .map(|i| t_max * i as f64 / num_time_steps as f64)
            .chain(times.iter().copied())
            .collect();
        grid.sort_by(f64::total_cmp);
        grid.dedup_by(|later, kept| (*later - *kept).abs() < GRID_TOLERANCE);

        let record = times
            .iter()
            .map(|&t| {
                grid.iter()
                    .position(|&g| (g - t).abs() < GRID_TOLERANCE)
                    .ok_or_else(|| SdeError::InvalidConfiguration {
                        field: "times".to_string(),
                        reason: format!("sampling time {} missing from grid", t),
                    })
            })
            .collect::<SdeResult<Vec<_>>>()?;

        Ok((grid, record))
    }

    /// Simulate `[num_samples, times.len(), dim]` prices starting from `initial_state`
    pub fn sample_paths<M: SdeModel + ?Sized>(
        model: &M,
        initial_state: &[f64],
        cfg: &SamplingConfig,
    ) -> SdeResult<Array3<f64>> {
        cfg.validate()?;
        let dim = model.dim();
        validate_len("initial_state", initial_state.len(), dim)?;
        for &s0 in initial_state {
            validate_positive("initial_state", s0)?;
        }

        let (grid, record) = Self::time_grid(&cfg.times, cfg.num_time_steps)?;
        tracing::debug!(
            grid_points = grid.len(),
            num_times = cfg.times.len(),
            "built simulation time grid"
        );

        let n = cfg.num_samples;
        let mut sampler =
            NormalSampler::new(cfg.random_type, cfg.seed, n, dim, cfg.execution)?;
        let mut log_x = Array2::from_shape_fn((n, dim), |(_, d)| initial_state[d].ln());
        let mut paths = Array3::zeros((n, cfg.times.len(), dim));
        let correlation = model.correlation_factor().map(|l| l.t().to_owned());

        let mut next_record = 0;
        for (step, w) in grid.windows(2).enumerate() {
            let (t, t_next) = (w[0], w[1]);
            let dt = t_next - t;
            let sqrt_dt = dt.sqrt();

            let prices = log_x.mapv(f64::exp);
            let (drift, vol) = model.log_coefficients(t, prices.view(), cfg.execution)?;

            let mut dz = sampler.draws(step);
            if let Some(l_t) = &correlation {
                dz = dz.dot(l_t);
            }
            let dw = dz * sqrt_dt;

            let base = &log_x + &(&drift * dt);
            let support = &base + &(&vol * &dw);
            let support_up = &base + &(&vol * sqrt_dt);
            let support_down = &base - &(&vol * sqrt_dt);

            let eval = |x: &Array2<f64>| {
                model.log_coefficients(t_next, x.mapv(f64::exp).view(), cfg.execution)
            };
            let (drift_next, _) = eval(&support)?;
            let (_, vol_up) = eval(&support_up)?;
            let (_, vol_down) = eval(&support_down)?;

            let drift_avg = (&drift_next + &drift) * 0.5;
            let vol_avg = (&vol_up + &vol_down + &(&vol * 2.0)) * 0.25;
            let vol_slope = (&vol_up - &vol_down) * 0.25;

            match cfg.execution {
                ExecutionMode::Sequential => Zip::from(&mut log_x)
                    .and(&drift_avg)
                    .and(&vol_avg)
                    .and(&vol_slope)
                    .and(&dw)
                    .for_each(|x, &mu, &sigma, &slope, &shock| {
                        *x += weak_order_two_increment(mu, sigma, slope, shock, dt, sqrt_dt)
                    }),
                ExecutionMode::Parallel => par_azip!((
                    x in &mut log_x,
                    &mu in &drift_avg,
                    &sigma in &vol_avg,
                    &slope in &vol_slope,
                    &shock in &dw
                ) {
                    *x += weak_order_two_increment(mu, sigma, slope, shock, dt, sqrt_dt)
                }),
            }

            while next_record < record.len() && record[next_record] == step + 1 {
                paths
                    .slice_mut(s![.., next_record, ..])
                    .assign(&log_x.mapv(f64::exp));
                next_record += 1;
            }
        }

        if next_record != record.len() {
            return Err(SdeError::MonteCarloError {
                paths: n,
                reason: format!("recorded {} of {} sampling times", next_record, record.len()),
            });
        }
        Ok(paths)
    }
}

fn weak_order_two_increment(
    drift_avg: f64,
    vol_avg: f64,
    vol_slope: f64,
    dw: f64,
    dt: f64,
    sqrt_dt: f64,
) -> f64 {
    drift_avg * dt + vol_avg * dw + vol_slope * (dw * dw - dt) / sqrt_dt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::gbm::Gbm;
    use crate::rng::RandomType;
    use approx::assert_relative_eq;
    use ndarray::ArrayView2;

    #[test]
    fn test_time_grid_merges_sampling_times() {
        let (grid, record) = EulerMaruyama::time_grid(&[0.25, 1.0], 2).unwrap();
        assert_eq!(grid, vec![0.0, 0.25, 0.5, 1.0]);
        assert_eq!(record, vec![1, 3]);
    }

    #[test]
    fn test_time_grid_uniform() {
        let (grid, record) = EulerMaruyama::time_grid(&[1.0, 2.0], 20).unwrap();
        assert_eq!(grid.len(), 21);
        assert_relative_eq!(grid[10], 1.0, epsilon = 1e-12);
        assert_eq!(record, vec![10, 20]);
    }

    #[test]
    fn test_gbm_paths_are_positive_and_shaped() {
        let model = Gbm::new(2, 0.01, 0.2).unwrap();
        let cfg = SamplingConfig {
            times: vec![0.5, 1.0],
            num_samples: 100,
            num_time_steps: 4,
            ..Default::default()
        };
        let paths = EulerMaruyama::sample_paths(&model, &[1.0, 2.0], &cfg).unwrap();
        assert_eq!(paths.dim(), (100, 2, 2));
        assert!(paths.iter().all(|&p| p > 0.0 && p.is_finite()));
    }

    #[test]
    fn test_gbm_matches_exact_step() {
        let model = Gbm::new(1, 0.03, 0.25).unwrap();
        let cfg = SamplingConfig {
            times: vec![1.0],
            num_samples: 4,
            num_time_steps: 1,
            random_type: RandomType::Stateless,
            seed: Some([3, 4]),
            execution: ExecutionMode::Sequential,
        };
        let paths = EulerMaruyama::sample_paths(&model, &[100.0], &cfg).unwrap();
        let mut sampler = NormalSampler::new(
            RandomType::Stateless,
            Some([3, 4]),
            4,
            1,
            ExecutionMode::Sequential,
        )
        .unwrap();
        let z = sampler.draws(0);
        for i in 0..4 {
            assert_relative_eq!(
                paths[[i, 0, 0]],
                model.exact_step(100.0, 1.0, z[[i, 0]]),
                max_relative = 1e-12
            );
        }
    }

    /// `dX = -a X dt + (c + b X) dW`, state dependent in both coefficients
    struct AffineLogModel {
        a: f64,
        b: f64,
        c: f64,
    }

    impl SdeModel for AffineLogModel {
        fn dim(&self) -> usize {
            1
        }

        fn log_coefficients(
            &self,
            _t: f64,
            prices: ArrayView2<f64>,
            _execution: ExecutionMode,
        ) -> SdeResult<(Array2<f64>, Array2<f64>)> {
            let x = prices.mapv(f64::ln);
            Ok((x.mapv(|x| -self.a * x), x.mapv(|x| self.c + self.b * x)))
        }
    }

    #[test]
    fn test_step_carries_second_order_corrections() {
        let model = AffineLogModel {
            a: 0.5,
            b: 0.4,
            c: 0.2,
        };
        let (x0, dt) = (0.3_f64, 0.25_f64);
        let cfg = SamplingConfig {
            times: vec![dt],
            num_samples: 6,
            num_time_steps: 1,
            random_type: RandomType::Stateless,
            seed: Some([7, 8]),
            execution: ExecutionMode::Sequential,
        };
        let paths = EulerMaruyama::sample_paths(&model, &[x0.exp()], &cfg).unwrap();
        let mut sampler = NormalSampler::new(
            RandomType::Stateless,
            Some([7, 8]),
            6,
            1,
            ExecutionMode::Sequential,
        )
        .unwrap();
        let z = sampler.draws(0);

        let sqrt_dt = dt.sqrt();
        let sigma = |x: f64| model.c + model.b * x;
        for i in 0..6 {
            let dw = sqrt_dt * z[[i, 0]];
            let mu0 = -model.a * x0;
            let support = x0 + mu0 * dt + sigma(x0) * dw;
            let up = sigma(x0 + mu0 * dt + sigma(x0) * sqrt_dt);
            let down = sigma(x0 + mu0 * dt - sigma(x0) * sqrt_dt);
            let expected = x0
                + 0.5 * (-model.a * support + mu0) * dt
                + 0.25 * (up + down + 2.0 * sigma(x0)) * dw
                + 0.25 * (up - down) * (dw * dw - dt) / sqrt_dt;
            let euler = x0 + mu0 * dt + sigma(x0) * dw;

            let simulated = paths[[i, 0, 0]].ln();
            assert_relative_eq!(simulated, expected, epsilon = 1e-12);
            assert!((simulated - euler).abs() > 1e-6, "sample {} took a plain Euler step", i);
        }
    }

    #[test]
    fn test_wrong_initial_state_is_rejected() {
        let model = Gbm::new(2, 0.0, 0.2).unwrap();
        let cfg = SamplingConfig::default();
        assert!(EulerMaruyama::sample_paths(&model, &[1.0], &cfg).is_err());
        assert!(EulerMaruyama::sample_paths(&model, &[1.0, -1.0], &cfg).is_err());
    }
}

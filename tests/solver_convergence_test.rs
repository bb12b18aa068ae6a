// tests/solver_convergence_test.rs
use local_vol_sde::market::RateCurve;
use local_vol_sde::mc::{ExecutionMode, SamplingConfig};
use local_vol_sde::models::{Gbm, LocalVolatilityModel};
use local_vol_sde::rng::{NormalSampler, RandomType};
use local_vol_sde::scenario::MarketScenario;
use local_vol_sde::solvers::euler_maruyama::EulerMaruyama;
use ndarray::s;

// Exact solution path for Geometric Brownian Motion
fn gbm_exact_solution_path(
    s0: f64,
    r: f64,
    sigma: f64,
    dt: f64,
    normal_draws: &[f64],
) -> Vec<f64> {
    let mut path = Vec::with_capacity(normal_draws.len() + 1);
    path.push(s0);
    let mut current_s = s0;
    let sqrt_dt = dt.sqrt();

    for &z in normal_draws {
        current_s *= ((r - 0.5 * sigma * sigma) * dt + sigma * sqrt_dt * z).exp();
        path.push(current_s);
    }
    path
}

#[test]
fn test_constant_coefficients_step_is_exact() {
    let gbm = Gbm::new(1, 0.05, 0.3).unwrap();
    let s0 = 100.0;
    let num_paths = 64;

    for num_steps in [1usize, 4, 16] {
        let dt = 1.0 / num_steps as f64;
        let cfg = SamplingConfig {
            times: vec![1.0],
            num_samples: num_paths,
            num_time_steps: num_steps,
            random_type: RandomType::Stateless,
            seed: Some([5, 6]),
            execution: ExecutionMode::Sequential,
        };
        let paths = EulerMaruyama::sample_paths(&gbm, &[s0], &cfg).unwrap();

        let mut sampler = NormalSampler::new(
            RandomType::Stateless,
            Some([5, 6]),
            num_paths,
            1,
            ExecutionMode::Sequential,
        )
        .unwrap();
        let draws: Vec<_> = (0..num_steps).map(|step| sampler.draws(step)).collect();

        for i in 0..num_paths {
            let z: Vec<f64> = draws.iter().map(|d| d[[i, 0]]).collect();
            let exact = gbm_exact_solution_path(s0, gbm.mu, gbm.sigma, dt, &z);
            let s_exact = exact[num_steps];
            let rel = (paths[[i, 0, 0]] - s_exact).abs() / s_exact;
            assert!(
                rel < 1e-10,
                "path {} with {} steps: relative error {}",
                i,
                num_steps,
                rel
            );
        }
    }
}

#[test]
fn test_local_vol_forward_is_martingale() {
    // The scheme is weak order two, so at these step counts the forward bias
    // sits well below the Monte Carlo noise.
    let scenario = MarketScenario::smile_test(2).unwrap();
    let (r, q) = (0.05, 0.02);
    let model = LocalVolatilityModel::from_market_data(
        2,
        scenario.valuation_date,
        scenario.expiries.clone(),
        scenario.strikes.view(),
        scenario.implied_vols.view(),
        &scenario.spot,
        RateCurve::flat(r),
        &[q],
    )
    .unwrap();

    for num_steps in [10, 20, 40] {
        let cfg = SamplingConfig {
            times: scenario.expiry_times.row(0).to_vec(),
            num_samples: 20_000,
            num_time_steps: num_steps,
            ..Default::default()
        };
        let paths = model.sample_paths(&scenario.spot, &cfg).unwrap();
        for (i, &t) in cfg.times.iter().enumerate() {
            let forward = ((r - q) * t).exp();
            for d in 0..2 {
                let mean = paths.slice(s![.., i, d]).mean().unwrap();
                assert!(
                    (mean - forward).abs() < 0.005,
                    "steps {}, t {}, dim {}: mean {} vs forward {}",
                    num_steps,
                    t,
                    d,
                    mean,
                    forward
                );
            }
        }
    }
}

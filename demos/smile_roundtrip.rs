// demos/smile_roundtrip.rs
use local_vol_sde::market::RateCurve;
use local_vol_sde::mc::{ExecutionMode, SamplingConfig};
use local_vol_sde::models::LocalVolatilityModel;
use local_vol_sde::scenario::MarketScenario;
use local_vol_sde::smile::{reconstruct_smile, SmileTolerance};
use local_vol_sde::SdeResult;
use nalgebra::DMatrix;
use ndarray::array;
use tracing_subscriber::EnvFilter;

fn main() -> SdeResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("Local Volatility Smile Round-Trip");
    println!("=================================\n");

    let scenario = MarketScenario::smile_test(2)?;
    let rates = RateCurve::flat(0.02);
    let model = LocalVolatilityModel::from_market_data(
        2,
        scenario.valuation_date,
        scenario.expiries.clone(),
        scenario.strikes.view(),
        scenario.implied_vols.view(),
        &scenario.spot,
        rates.clone(),
        &[0.0],
    )?
    .with_correlation(DMatrix::from_row_slice(2, 2, &[1.0, 0.6, 0.6, 1.0]))?;

    println!("Local volatility at t = 1.0 (dimension 0):");
    let spots = array![[0.8, 0.8], [0.9, 0.9], [1.0, 1.0], [1.1, 1.1], [1.25, 1.25]];
    let local_vol = model.local_volatility(1.0, spots.view(), ExecutionMode::Sequential)?;
    for (s, lv) in spots.column(0).iter().zip(local_vol.column(0).iter()) {
        println!("  S = {:.2}: σ_loc = {:.4}", s, lv);
    }

    let cfg = SamplingConfig {
        times: scenario.expiry_times.row(0).to_vec(),
        num_samples: 50_000,
        num_time_steps: 40,
        ..Default::default()
    };
    let paths = model.sample_paths(&scenario.spot, &cfg)?;

    let report = reconstruct_smile(
        paths.view(),
        &scenario,
        &rates,
        &[1, 2, 3],
        SmileTolerance::default(),
    )?;

    println!(
        "\n{:<5} {:<7} {:>8} {:>10} {:>10} {:>8}",
        "Dim", "Expiry", "Strike", "Quoted", "Simulated", "Passed"
    );
    println!("{:-<53}", "");
    for p in &report.points {
        println!(
            "{:<5} {:<7} {:>8.2} {:>10.4} {:>10.4} {:>8}",
            p.dim, p.expiry_index, p.strike, p.expected, p.simulated, p.passed
        );
    }
    println!("\nMax absolute error: {:.5}", report.max_abs_error());

    report.into_result()?;
    println!("Smile recovered within tolerance.");
    Ok(())
}

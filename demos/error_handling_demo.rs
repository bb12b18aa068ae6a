// demos/error_handling_demo.rs
use local_vol_sde::analytics::bs_analytic;
use local_vol_sde::error::SdeError;
use local_vol_sde::market::{FlatVolatility, RateCurve};
use local_vol_sde::mc::SamplingConfig;
use local_vol_sde::models::LocalVolatilityModel;
use local_vol_sde::rng::RandomType;
use local_vol_sde::scenario::MarketScenario;
use local_vol_sde::smile::{reconstruct_smile, SmileTolerance};
use nalgebra::DMatrix;
use ndarray::Array3;

fn report<T>(result: Result<T, SdeError>) {
    match result {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(e) => println!("   ✓ Caught error: {}", e),
    }
}

fn main() {
    println!("Error Handling Demo for local-vol-sde");
    println!("=====================================\n");

    let scenario = MarketScenario::smile_test(2).expect("scenario builds");

    // Test 1: Spot vector does not match the dimension
    println!("1. Testing mismatched spot vector...");
    report(LocalVolatilityModel::from_market_data(
        2,
        scenario.valuation_date,
        scenario.expiries.clone(),
        scenario.strikes.view(),
        scenario.implied_vols.view(),
        &[1.0],
        RateCurve::flat(0.0),
        &[0.0],
    ));

    // Test 2: Strikes that are not increasing
    println!("\n2. Testing unsorted strike grid...");
    let mut strikes = scenario.strikes.clone();
    strikes[[0, 0, 1]] = 2.0;
    report(LocalVolatilityModel::from_market_data(
        2,
        scenario.valuation_date,
        scenario.expiries.clone(),
        strikes.view(),
        scenario.implied_vols.view(),
        &scenario.spot,
        RateCurve::flat(0.0),
        &[0.0],
    ));

    // Test 3: Correlation matrix that is not positive definite
    println!("\n3. Testing invalid correlation matrix...");
    let model = LocalVolatilityModel::from_volatility_surface(
        2,
        &[1.0, 1.0],
        FlatVolatility { dim: 2, sigma: 0.2 },
        RateCurve::flat(0.0),
        &[0.0],
    )
    .expect("flat model builds");
    report(model.with_correlation(DMatrix::from_row_slice(2, 2, &[1.0, 1.5, 1.5, 1.0])));

    // Test 4: Invalid sampling configuration
    println!("\n4. Testing invalid sampling configurations...");
    let zero_samples = SamplingConfig {
        num_samples: 0,
        ..Default::default()
    };
    report(zero_samples.validate());

    let odd_antithetic = SamplingConfig {
        num_samples: 1_001,
        random_type: RandomType::StatelessAntithetic,
        ..Default::default()
    };
    report(odd_antithetic.validate());

    let unseeded_stateless = SamplingConfig {
        seed: None,
        random_type: RandomType::Stateless,
        ..Default::default()
    };
    report(unseeded_stateless.validate());

    // Test 5: Option price outside the no-arbitrage bounds
    println!("\n5. Testing implied vol of an arbitrageable price...");
    report(bs_analytic::implied_vol(0.01, 0.5, 1.0, 1.0, 1.0, 0.0, true));

    // Test 6: Smile mismatch from degenerate paths
    println!("\n6. Testing smile check on degenerate paths...");
    let paths = Array3::from_elem((100, 2, 2), 1.0);
    match reconstruct_smile(
        paths.view(),
        &scenario,
        &RateCurve::flat(0.0),
        &[1, 2, 3],
        SmileTolerance::default(),
    ) {
        Ok(smile) => report(smile.into_result()),
        Err(e) => println!("   ✓ Caught error: {}", e),
    }

    println!("\nError handling demo complete!");
}

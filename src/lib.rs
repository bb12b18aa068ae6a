//! # local-vol-sde: Local Volatility Monte Carlo
//!
//! Builds a Dupire local volatility model from an implied volatility
//! surface, samples multi-dimensional price paths with a batched weak second-order
//! log-price scheme, and checks that the Monte Carlo prices reproduce the smile the
//! model was calibrated to.
//!
//! ## Key Features
//!
//! - **Market objects**: Implied vol surfaces over dated expiries, rate curves, day counts
//! - **Dupire local volatility**: Finite-difference derivatives of any `VolatilityFn`
//! - **Reproducible sampling**: Stateless and antithetic normals, identical across execution modes
//! - **Parallel execution**: Rayon and ndarray parallel zips
//! - **Smile round-trip**: NaN-masked estimates inverted to implied vols
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use local_vol_sde::market::RateCurve;
//! use local_vol_sde::mc::SamplingConfig;
//! use local_vol_sde::models::LocalVolatilityModel;
//! use local_vol_sde::scenario::MarketScenario;
//! use local_vol_sde::smile::{reconstruct_smile, SmileTolerance};
//!
//! # fn main() -> local_vol_sde::SdeResult<()> {
//! let scenario = MarketScenario::smile_test(1)?;
//! let rates = RateCurve::flat(0.0);
//! let model = LocalVolatilityModel::from_market_data(
//!     1,
//!     scenario.valuation_date,
//!     scenario.expiries.clone(),
//!     scenario.strikes.view(),
//!     scenario.implied_vols.view(),
//!     &scenario.spot,
//!     rates.clone(),
//!     &[0.0],
//! )?;
//!
//! let cfg = SamplingConfig {
//!     times: scenario.expiry_times.row(0).to_vec(),
//!     ..Default::default()
//! };
//! let paths = model.sample_paths(&scenario.spot, &cfg)?;
//! let report = reconstruct_smile(
//!     paths.view(),
//!     &scenario,
//!     &rates,
//!     &[1, 2, 3],
//!     SmileTolerance::default(),
//! )?;
//! println!("max smile error: {:.5}", report.max_abs_error());
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod analytics;
pub mod dates;
pub mod error;
pub mod interpolation;
pub mod market;
pub mod math_utils;
pub mod mc;
pub mod models;
pub mod output;
pub mod rng;
pub mod scenario;
pub mod smile;
pub mod solvers;

// Re-export commonly used types for convenience
pub use error::{SdeError, SdeResult};

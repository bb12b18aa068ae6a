// src/models/model.rs
use crate::error::SdeResult;
use crate::mc::config::ExecutionMode;
use ndarray::{Array2, ArrayView2};

/// A diagonal Itô diffusion on log-prices
///
/// For prices `S` of shape `[num_samples, dim]` at time `t` the model
/// returns the drift and volatility of `X = ln S`:
/// ```text
/// dX_d = μ_d(t, S_d) dt + σ_d(t, S_d) dW_d
/// ```
/// with `dW` optionally correlated through [`SdeModel::correlation_factor`].
/// Row `i`, column `d` of the outputs may depend on `prices[[i, d]]` only.
pub trait SdeModel: Send + Sync {
    fn dim(&self) -> usize;

    /// `(μ, σ)`, both shaped like `prices`
    fn log_coefficients(
        &self,
        t: f64,
        prices: ArrayView2<f64>,
        execution: ExecutionMode,
    ) -> SdeResult<(Array2<f64>, Array2<f64>)>;

    /// Lower Cholesky factor `L` of the driver correlation, `dW = L dZ`
    fn correlation_factor(&self) -> Option<&Array2<f64>> {
        None
    }
}

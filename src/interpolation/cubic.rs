// src/interpolation/cubic.rs
//! Natural Cubic Spline
//!
//! # Mathematical Framework
//!
//! On each interval `[x_i, x_{i+1}]` with `h = x_{i+1} - x_i`,
//! `a = (x_{i+1} - x) / h` and `b = (x - x_i) / h`:
//! ```text
//! S(x) = a y_i + b y_{i+1} + ((a³ - a) M_i + (b³ - b) M_{i+1}) h² / 6
//! ```
//! where the second derivatives `M_i` solve the tridiagonal system
//! ```text
//! h_{i-1} M_{i-1} + 2 (h_{i-1} + h_i) M_i + h_i M_{i+1}
//!     = 6 ((y_{i+1} - y_i) / h_i - (y_i - y_{i-1}) / h_{i-1})
//! ```
//! with the natural boundary `M_0 = M_{n-1} = 0`.
//!
//! Outside `[x_0, x_{n-1}]` the spline is constant (flat extrapolation).

use crate::error::{validation::*, SdeError, SdeResult};

#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    second_derivatives: Vec<f64>,
}

impl CubicSpline {
    pub fn new(x: &[f64], y: &[f64]) -> SdeResult<Self> {
        if x.is_empty() {
            return Err(SdeError::InterpolationError {
                reason: "spline needs at least one knot".to_string(),
            });
        }
        if x.len() != y.len() {
            return Err(SdeError::InterpolationError {
                reason: format!("{} knots but {} values", x.len(), y.len()),
            });
        }
        validate_strictly_increasing("spline knots", x)?;
        for &v in y {
            validate_finite("spline value", v)?;
        }

        let second_derivatives = natural_second_derivatives(x, y);
        Ok(CubicSpline {
            x: x.to_vec(),
            y: y.to_vec(),
            second_derivatives,
        })
    }

    pub fn knots(&self) -> &[f64] {
        &self.x
    }

    /// Spline value at `x`
    pub fn value(&self, x: f64) -> f64 {
        let n = self.x.len();
        if x.is_nan() {
            return f64::NAN;
        }
        if n == 1 || x <= self.x[0] {
            return self.y[0];
        }
        if x >= self.x[n - 1] {
            return self.y[n - 1];
        }

        // First knot strictly greater than x; 1 <= hi <= n - 1 here.
        let hi = self.x.partition_point(|&k| k <= x);
        let lo = hi - 1;
        let h = self.x[hi] - self.x[lo];
        let a = (self.x[hi] - x) / h;
        let b = (x - self.x[lo]) / h;
        let m_lo = self.second_derivatives[lo];
        let m_hi = self.second_derivatives[hi];

        a * self.y[lo]
            + b * self.y[hi]
            + ((a * a * a - a) * m_lo + (b * b * b - b) * m_hi) * h * h / 6.0
    }
}

/// Solve for the knot second derivatives with the Thomas algorithm
fn natural_second_derivatives(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut m = vec![0.0; n];
    if n < 3 {
        return m;
    }

    let interior = n - 2;
    let mut diag = vec![0.0; interior];
    let mut upper = vec![0.0; interior];
    let mut rhs = vec![0.0; interior];
    for k in 0..interior {
        let i = k + 1;
        let h_prev = x[i] - x[i - 1];
        let h_next = x[i + 1] - x[i];
        diag[k] = 2.0 * (h_prev + h_next);
        upper[k] = h_next;
        rhs[k] = 6.0 * ((y[i + 1] - y[i]) / h_next - (y[i] - y[i - 1]) / h_prev);
    }

    // Forward sweep; the sub-diagonal entry of row k is h_{k} = x[k+1] - x[k].
    for k in 1..interior {
        let lower = x[k + 1] - x[k];
        let w = lower / diag[k - 1];
        diag[k] -= w * upper[k - 1];
        rhs[k] -= w * rhs[k - 1];
    }

    m[interior] = rhs[interior - 1] / diag[interior - 1];
    for k in (0..interior - 1).rev() {
        m[k + 1] = (rhs[k] - upper[k] * m[k + 2]) / diag[k];
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    const STRIKES: [f64; 5] = [0.1, 0.9, 1.0, 1.1, 3.0];
    const VOLS: [f64; 5] = [0.135, 0.13, 0.1, 0.11, 0.13];

    #[test]
    fn test_interpolates_knots() {
        let spline = CubicSpline::new(&STRIKES, &VOLS).unwrap();
        for (&k, &v) in STRIKES.iter().zip(VOLS.iter()) {
            assert_relative_eq!(spline.value(k), v, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_natural_boundary() {
        let spline = CubicSpline::new(&STRIKES, &VOLS).unwrap();
        assert_eq!(spline.second_derivatives[0], 0.0);
        assert_eq!(spline.second_derivatives[4], 0.0);
        // A zero end curvature makes the spline linear to second order at the knot.
        let h = 1e-4;
        let curvature = (spline.value(0.1 + 2.0 * h) - 2.0 * spline.value(0.1 + h)
            + spline.value(0.1))
            / (h * h);
        assert_abs_diff_eq!(curvature, 0.0, epsilon = 1e-2);
    }

    #[test]
    fn test_flat_extrapolation() {
        let spline = CubicSpline::new(&STRIKES, &VOLS).unwrap();
        assert_eq!(spline.value(0.01), 0.135);
        assert_eq!(spline.value(10.0), 0.13);
    }

    #[test]
    fn test_nan_query_propagates() {
        let spline = CubicSpline::new(&STRIKES, &VOLS).unwrap();
        assert!(spline.value(f64::NAN).is_nan());
    }

    #[test]
    fn test_reproduces_linear_data() {
        let x = [0.0, 1.0, 2.5, 4.0];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        let spline = CubicSpline::new(&x, &y).unwrap();
        assert_relative_eq!(spline.value(1.7), 4.4, epsilon = 1e-12);
        for &m in &spline.second_derivatives {
            assert_abs_diff_eq!(m, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rejects_unsorted_knots() {
        assert!(CubicSpline::new(&[1.0, 0.5], &[0.1, 0.2]).is_err());
        assert!(CubicSpline::new(&[0.5, 1.0], &[0.1]).is_err());
        assert!(CubicSpline::new(&[], &[]).is_err());
    }
}

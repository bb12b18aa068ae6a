// src/error.rs
use thiserror::Error;

/// Error types for the local-vol-sde library
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SdeError {
    /// Invalid parameter values
    #[error("Invalid parameter '{parameter}' = {value}: {constraint}")]
    InvalidParameters {
        parameter: String,
        value: f64,
        constraint: String,
    },

    /// Numerical instability or convergence failure
    #[error("Numerical instability in {method}: {reason}")]
    NumericalInstability { method: String, reason: String },

    /// Invalid configuration or shape mismatch
    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// Monte Carlo simulation error
    #[error("Monte Carlo simulation error with {paths} paths: {reason}")]
    MonteCarloError { paths: usize, reason: String },

    /// Interpolation grid or query error
    #[error("Interpolation error: {reason}")]
    InterpolationError { reason: String },

    /// Calendar date construction error
    #[error("Invalid date {year:04}-{month:02}-{day:02}")]
    DateError { year: i32, month: u32, day: u32 },

    /// Reconstructed implied volatility outside tolerance
    #[error(
        "Smile mismatch at dim {dim}, expiry {expiry_index}, strike {strike}: \
         simulated {simulated:.6} vs expected {expected:.6}"
    )]
    SmileMismatch {
        dim: usize,
        expiry_index: usize,
        strike: f64,
        expected: f64,
        simulated: f64,
    },
}

/// Result type alias for local-vol-sde operations
pub type SdeResult<T> = Result<T, SdeError>;

/// Validation utilities
pub mod validation {
    use super::{SdeError, SdeResult};

    /// Validate that a parameter is positive
    pub fn validate_positive(name: &str, value: f64) -> SdeResult<()> {
        if value > 0.0 && value.is_finite() {
            Ok(())
        } else {
            Err(SdeError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be positive (> 0)".to_string(),
            })
        }
    }

    /// Validate that a parameter is non-negative
    pub fn validate_non_negative(name: &str, value: f64) -> SdeResult<()> {
        if value >= 0.0 && value.is_finite() {
            Ok(())
        } else {
            Err(SdeError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be non-negative (≥ 0)".to_string(),
            })
        }
    }

    /// Validate that a parameter is within a range
    pub fn validate_range(name: &str, value: f64, min: f64, max: f64) -> SdeResult<()> {
        if value < min || value > max || value.is_nan() {
            Err(SdeError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: format!("must be in range [{}, {}]", min, max),
            })
        } else {
            Ok(())
        }
    }

    /// Validate correlation parameter
    pub fn validate_correlation(name: &str, rho: f64) -> SdeResult<()> {
        validate_range(name, rho, -1.0, 1.0)
    }

    /// Validate that a value is finite and not NaN
    pub fn validate_finite(name: &str, value: f64) -> SdeResult<()> {
        if !value.is_finite() {
            Err(SdeError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be finite (not NaN or infinite)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate samples count
    pub fn validate_paths(paths: usize) -> SdeResult<()> {
        if paths == 0 {
            Err(SdeError::InvalidConfiguration {
                field: "num_samples".to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else if paths > 1_000_000_000 {
            Err(SdeError::InvalidConfiguration {
                field: "num_samples".to_string(),
                reason: "exceeds maximum allowed (1 billion)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate steps count
    pub fn validate_steps(steps: usize) -> SdeResult<()> {
        if steps == 0 {
            Err(SdeError::InvalidConfiguration {
                field: "num_time_steps".to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else if steps > 100_000 {
            Err(SdeError::InvalidConfiguration {
                field: "num_time_steps".to_string(),
                reason: "exceeds maximum allowed (100,000)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a grid axis is finite and strictly increasing
    pub fn validate_strictly_increasing(name: &str, values: &[f64]) -> SdeResult<()> {
        for &v in values {
            validate_finite(name, v)?;
        }
        if let Some(w) = values.windows(2).find(|w| w[1] <= w[0]) {
            return Err(SdeError::InvalidParameters {
                parameter: name.to_string(),
                value: w[1],
                constraint: format!("must be strictly increasing (follows {})", w[0]),
            });
        }
        Ok(())
    }

    /// Validate the length of a per-dimension input
    pub fn validate_len(name: &str, len: usize, expected: usize) -> SdeResult<()> {
        if len != expected {
            Err(SdeError::InvalidConfiguration {
                field: name.to_string(),
                reason: format!("expected {} entries, got {}", expected, len),
            })
        } else {
            Ok(())
        }
    }

    /// Validate a correlation matrix: square, unit diagonal, symmetric, entries in [-1, 1]
    pub fn validate_correlation_matrix(matrix: &nalgebra::DMatrix<f64>) -> SdeResult<()> {
        if !matrix.is_square() {
            return Err(SdeError::InvalidConfiguration {
                field: "correlation".to_string(),
                reason: format!("matrix must be square, got {}x{}", matrix.nrows(), matrix.ncols()),
            });
        }
        let n = matrix.nrows();
        for i in 0..n {
            if (matrix[(i, i)] - 1.0).abs() > 1e-12 {
                return Err(SdeError::InvalidParameters {
                    parameter: format!("correlation[{i}][{i}]"),
                    value: matrix[(i, i)],
                    constraint: "diagonal entries must equal 1".to_string(),
                });
            }
            for j in 0..i {
                validate_correlation(&format!("correlation[{i}][{j}]"), matrix[(i, j)])?;
                if (matrix[(i, j)] - matrix[(j, i)]).abs() > 1e-12 {
                    return Err(SdeError::InvalidConfiguration {
                        field: "correlation".to_string(),
                        reason: format!("matrix is not symmetric at ({}, {})", i, j),
                    });
                }
            }
        }
        Ok(())
    }
}

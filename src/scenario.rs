// src/scenario.rs
//! Deterministic market scenarios for smile round-trip checks
//!
//! Each dimension gets the same two-expiry smile:
//!
//! | strike | 0.1   | 0.9  | 1.0 | 1.1  | 3.0  |
//! |--------|-------|------|-----|------|------|
//! | vol    | 0.135 | 0.13 | 0.1 | 0.11 | 0.13 |
//!
//! quoted on 2020-01-01 for expiries 2021-01-01 and 2022-01-01, with spot 1.0.

use crate::dates::{daycount_actual_365_fixed, date_from_ymd, dates_from_year_month_day};
use crate::error::{SdeError, SdeResult};
use chrono::NaiveDate;
use ndarray::{Array2, Array3};

pub const SMILE_STRIKES: [f64; 5] = [0.1, 0.9, 1.0, 1.1, 3.0];
pub const SMILE_VOLS: [f64; 5] = [0.135, 0.13, 0.1, 0.11, 0.13];

#[derive(Debug, Clone, PartialEq)]
pub struct MarketScenario {
    pub valuation_date: NaiveDate,
    /// `[dim][expiry]`
    pub expiries: Vec<Vec<NaiveDate>>,
    /// Actual/365 Fixed, `[dim, n_expiries]`
    pub expiry_times: Array2<f64>,
    /// `[dim, n_expiries, n_strikes]`
    pub strikes: Array3<f64>,
    /// `[dim, n_expiries, n_strikes]`
    pub implied_vols: Array3<f64>,
    pub spot: Vec<f64>,
}

impl MarketScenario {
    /// The fixed smile scenario replicated across `dim` underlyings
    pub fn smile_test(dim: usize) -> SdeResult<Self> {
        if dim == 0 {
            return Err(SdeError::InvalidConfiguration {
                field: "dim".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        let valuation_date = date_from_ymd(2020, 1, 1)?;
        let per_dim = dates_from_year_month_day(&[2021, 2022], &[1, 1], &[1, 1])?;
        let n_expiries = per_dim.len();
        let n_strikes = SMILE_STRIKES.len();

        let times = daycount_actual_365_fixed(valuation_date, &per_dim);
        let expiry_times = Array2::from_shape_fn((dim, n_expiries), |(_, i)| times[i]);
        let strikes = Array3::from_shape_fn((dim, n_expiries, n_strikes), |(_, _, j)| {
            SMILE_STRIKES[j]
        });
        let implied_vols =
            Array3::from_shape_fn((dim, n_expiries, n_strikes), |(_, _, j)| SMILE_VOLS[j]);

        Ok(MarketScenario {
            valuation_date,
            expiries: vec![per_dim; dim],
            expiry_times,
            strikes,
            implied_vols,
            spot: vec![1.0; dim],
        })
    }

    pub fn dim(&self) -> usize {
        self.spot.len()
    }

    pub fn num_expiries(&self) -> usize {
        self.expiry_times.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_shapes() {
        let s = MarketScenario::smile_test(3).unwrap();
        assert_eq!(s.dim(), 3);
        assert_eq!(s.num_expiries(), 2);
        assert_eq!(s.strikes.dim(), (3, 2, 5));
        assert_eq!(s.implied_vols.dim(), (3, 2, 5));
        assert_eq!(s.expiries.len(), 3);
        assert_eq!(s.strikes[[2, 1, 1]], 0.9);
        assert_eq!(s.implied_vols[[1, 0, 2]], 0.1);
    }

    #[test]
    fn test_scenario_is_reproducible() {
        assert_eq!(
            MarketScenario::smile_test(2).unwrap(),
            MarketScenario::smile_test(2).unwrap()
        );
    }

    #[test]
    fn test_zero_dim_is_rejected() {
        assert!(MarketScenario::smile_test(0).is_err());
    }
}

// src/market/volatility_surface.rs
//! Implied Volatility Surfaces
//!
//! A [`VolatilitySurface`] keeps the market quotes it was built from
//! (valuation date, expiry dates, strike and implied-vol grids) together with
//! an interpolator answering batched queries:
//! ```text
//! (t, strikes: [num_points, dim]) -> vols: [num_points, dim]
//! ```
//! The grids themselves are laid out per dimension (`[dim, n_expiries,
//! n_strikes]`), which is the transpose of the query layout. The default
//! interpolator ([`interpolation_2d_adapter`]) performs that transpose and
//! broadcasts the scalar time before delegating to [`Interpolation2D`].

use crate::dates::DayCount;
use crate::error::{validation::*, SdeError, SdeResult};
use crate::interpolation::Interpolation2D;
use chrono::NaiveDate;
use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3};

/// Batched surface query: `(time, strikes [num_points, dim]) -> vols [num_points, dim]`
pub type VolInterpolator =
    Box<dyn Fn(f64, ArrayView2<f64>) -> SdeResult<Array2<f64>> + Send + Sync>;

/// Anything that can quote implied volatilities for a batch of strikes
pub trait VolatilityFn: Send + Sync {
    /// Number of underlyings the surface covers
    fn dim(&self) -> usize;

    /// Implied vols for `strikes` of shape `[num_points, dim]` at `time`
    fn volatility(&self, time: f64, strikes: ArrayView2<f64>) -> SdeResult<Array2<f64>>;
}

/// Wrap an [`Interpolation2D`] (batch axis = dimension) into a [`VolInterpolator`]
pub fn interpolation_2d_adapter(interpolator: Interpolation2D) -> VolInterpolator {
    Box::new(move |time: f64, strikes: ArrayView2<f64>| {
        let strikes_by_dim = strikes.t();
        let times = Array2::from_elem(strikes_by_dim.raw_dim(), time);
        let vols = interpolator.interpolate(times.view(), strikes_by_dim)?;
        Ok(vols.reversed_axes())
    })
}

/// Year fractions `[dim, n_expiries]` from `valuation_date` to each expiry
pub fn expiry_times(
    valuation_date: NaiveDate,
    expiries: &[Vec<NaiveDate>],
    day_count: DayCount,
) -> SdeResult<Array2<f64>> {
    let dim = expiries.len();
    let n_expiries = expiries.first().map_or(0, Vec::len);
    if dim == 0 || n_expiries == 0 {
        return Err(SdeError::InvalidConfiguration {
            field: "expiries".to_string(),
            reason: "need at least one dimension and one expiry".to_string(),
        });
    }

    let mut times = Array2::zeros((dim, n_expiries));
    for (d, row) in expiries.iter().enumerate() {
        validate_len(&format!("expiries[{d}]"), row.len(), n_expiries)?;
        for (i, &expiry) in row.iter().enumerate() {
            let t = day_count.year_fraction(valuation_date, expiry);
            validate_positive(&format!("expiry_times[{d}][{i}]"), t)?;
            times[[d, i]] = t;
        }
    }
    Ok(times)
}

pub struct VolatilitySurface {
    valuation_date: NaiveDate,
    expiries: Vec<Vec<NaiveDate>>,
    expiry_times: Array2<f64>,
    strikes: Array3<f64>,
    implied_vols: Array3<f64>,
    interpolator: VolInterpolator,
}

impl VolatilitySurface {
    /// Build a surface interpolated with [`Interpolation2D`] over Actual/365
    /// Fixed expiry times
    pub fn new(
        valuation_date: NaiveDate,
        expiries: Vec<Vec<NaiveDate>>,
        strikes: ArrayView3<f64>,
        implied_vols: ArrayView3<f64>,
    ) -> SdeResult<Self> {
        let times = expiry_times(valuation_date, &expiries, DayCount::Actual365Fixed)?;
        let interpolator = Interpolation2D::new(times.view(), strikes, implied_vols)?;
        Self::with_interpolator(
            valuation_date,
            expiries,
            strikes,
            implied_vols,
            interpolation_2d_adapter(interpolator),
        )
    }

    /// Build a surface around a caller-supplied batched interpolator
    pub fn with_interpolator<F>(
        valuation_date: NaiveDate,
        expiries: Vec<Vec<NaiveDate>>,
        strikes: ArrayView3<f64>,
        implied_vols: ArrayView3<f64>,
        interpolator: F,
    ) -> SdeResult<Self>
    where
        F: Fn(f64, ArrayView2<f64>) -> SdeResult<Array2<f64>> + Send + Sync + 'static,
    {
        let times = expiry_times(valuation_date, &expiries, DayCount::Actual365Fixed)?;
        let (dim, n_expiries) = times.dim();
        let (s_dim, s_expiries, n_strikes) = strikes.dim();
        if (s_dim, s_expiries) != (dim, n_expiries) || implied_vols.dim() != strikes.dim() {
            return Err(SdeError::InvalidConfiguration {
                field: "volatility_surface".to_string(),
                reason: format!(
                    "expiries {:?}, strikes {:?} and implied vols {:?} disagree",
                    times.dim(),
                    strikes.dim(),
                    implied_vols.dim()
                ),
            });
        }
        if n_strikes == 0 {
            return Err(SdeError::InvalidConfiguration {
                field: "strikes".to_string(),
                reason: "need at least one strike per expiry".to_string(),
            });
        }
        for d in 0..dim {
            validate_strictly_increasing(&format!("expiry_times[{d}]"), &times.row(d).to_vec())?;
            for i in 0..n_expiries {
                let row = strikes.slice(s![d, i, ..]).to_vec();
                validate_strictly_increasing(&format!("strikes[{d}][{i}]"), &row)?;
            }
        }
        for &k in strikes.iter() {
            validate_positive("strike", k)?;
        }
        for &v in implied_vols.iter() {
            validate_positive("implied_vol", v)?;
        }

        tracing::debug!(
            dim,
            n_expiries,
            n_strikes,
            %valuation_date,
            "built volatility surface"
        );

        Ok(VolatilitySurface {
            valuation_date,
            expiries,
            expiry_times: times,
            strikes: strikes.to_owned(),
            implied_vols: implied_vols.to_owned(),
            interpolator: Box::new(interpolator),
        })
    }

    pub fn valuation_date(&self) -> NaiveDate {
        self.valuation_date
    }

    pub fn expiries(&self) -> &[Vec<NaiveDate>] {
        &self.expiries
    }

    pub fn expiry_times(&self) -> ArrayView2<f64> {
        self.expiry_times.view()
    }

    pub fn strikes(&self) -> ArrayView3<f64> {
        self.strikes.view()
    }

    pub fn implied_vols(&self) -> ArrayView3<f64> {
        self.implied_vols.view()
    }
}

impl VolatilityFn for VolatilitySurface {
    fn dim(&self) -> usize {
        self.expiry_times.nrows()
    }

    fn volatility(&self, time: f64, strikes: ArrayView2<f64>) -> SdeResult<Array2<f64>> {
        validate_len("strike columns", strikes.ncols(), self.dim())?;
        let vols = (self.interpolator)(time, strikes)?;
        if vols.dim() != strikes.dim() {
            return Err(SdeError::InvalidConfiguration {
                field: "interpolator".to_string(),
                reason: format!(
                    "returned shape {:?} for query shape {:?}",
                    vols.dim(),
                    strikes.dim()
                ),
            });
        }
        Ok(vols)
    }
}

impl std::fmt::Debug for VolatilitySurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolatilitySurface")
            .field("valuation_date", &self.valuation_date)
            .field("expiry_times", &self.expiry_times)
            .field("strikes", &self.strikes.dim())
            .finish_non_exhaustive()
    }
}

/// A surface with the same implied vol at every time and strike
#[derive(Debug, Clone, Copy)]
pub struct FlatVolatility {
    pub dim: usize,
    pub sigma: f64,
}

impl VolatilityFn for FlatVolatility {
    fn dim(&self) -> usize {
        self.dim
    }

    fn volatility(&self, _time: f64, strikes: ArrayView2<f64>) -> SdeResult<Array2<f64>> {
        validate_len("strike columns", strikes.ncols(), self.dim)?;
        Ok(Array2::from_elem(strikes.raw_dim(), self.sigma))
    }
}

// src/interpolation/interpolation_2d.rs
//! Batched 2-D interpolation over a rectangular-per-row grid
//!
//! Each batch member `b` owns a grid of `nx` x-knots (expiry times) and, for
//! every x-knot, `ny` y-knots (strikes) with values `z` (implied vols):
//! ```text
//! x_data: [batch, nx]      y_data: [batch, nx, ny]      z_data: [batch, nx, ny]
//! ```
//! A query `(x, y)` is answered by evaluating the natural cubic splines of the
//! two x-knots bracketing `x` at `y`, then interpolating linearly in `x`.
//! Both directions extrapolate flat.

use super::cubic::CubicSpline;
use crate::error::{validation::*, SdeError, SdeResult};
use ndarray::{Array2, ArrayView2, ArrayView3, Zip};

#[derive(Debug, Clone)]
pub struct Interpolation2D {
    x_data: Array2<f64>,
    /// `splines[b][i]` interpolates along y at x-knot `x_data[[b, i]]`
    splines: Vec<Vec<CubicSpline>>,
}

impl Interpolation2D {
    pub fn new(
        x_data: ArrayView2<f64>,
        y_data: ArrayView3<f64>,
        z_data: ArrayView3<f64>,
    ) -> SdeResult<Self> {
        let (batch, nx) = x_data.dim();
        let (y_batch, y_nx, ny) = y_data.dim();
        if (y_batch, y_nx) != (batch, nx) || z_data.dim() != (batch, nx, ny) {
            return Err(SdeError::InterpolationError {
                reason: format!(
                    "grid shapes disagree: x {:?}, y {:?}, z {:?}",
                    x_data.dim(),
                    y_data.dim(),
                    z_data.dim()
                ),
            });
        }
        if batch == 0 || nx == 0 || ny == 0 {
            return Err(SdeError::InterpolationError {
                reason: "grid must be non-empty in every axis".to_string(),
            });
        }

        let mut splines = Vec::with_capacity(batch);
        for b in 0..batch {
            let row = x_data.row(b).to_vec();
            validate_strictly_increasing("expiry times", &row)?;
            let mut per_x = Vec::with_capacity(nx);
            for i in 0..nx {
                let ys = y_data.slice(ndarray::s![b, i, ..]).to_vec();
                let zs = z_data.slice(ndarray::s![b, i, ..]).to_vec();
                per_x.push(CubicSpline::new(&ys, &zs)?);
            }
            splines.push(per_x);
        }

        Ok(Interpolation2D {
            x_data: x_data.to_owned(),
            splines,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.x_data.nrows()
    }

    /// Interpolate at `[batch, n]` query points
    pub fn interpolate(&self, x: ArrayView2<f64>, y: ArrayView2<f64>) -> SdeResult<Array2<f64>> {
        if x.dim() != y.dim() {
            return Err(SdeError::InterpolationError {
                reason: format!("query shapes differ: x {:?}, y {:?}", x.dim(), y.dim()),
            });
        }
        if x.nrows() != self.batch_size() {
            return Err(SdeError::InterpolationError {
                reason: format!(
                    "query batch {} does not match grid batch {}",
                    x.nrows(),
                    self.batch_size()
                ),
            });
        }

        let mut out = Array2::zeros(x.raw_dim());
        for (b, ((mut out_row, x_row), y_row)) in out
            .rows_mut()
            .into_iter()
            .zip(x.rows())
            .zip(y.rows())
            .enumerate()
        {
            Zip::from(&mut out_row)
                .and(&x_row)
                .and(&y_row)
                .for_each(|o, &xv, &yv| *o = self.interpolate_point(b, xv, yv));
        }
        Ok(out)
    }

    /// Interpolate a single point of batch member `b`
    pub fn interpolate_point(&self, b: usize, x: f64, y: f64) -> f64 {
        let knots = self.x_data.row(b);
        let splines = &self.splines[b];
        let nx = knots.len();

        if nx == 1 || x <= knots[0] {
            return splines[0].value(y);
        }
        if x >= knots[nx - 1] {
            return splines[nx - 1].value(y);
        }

        let hi = knots.iter().position(|&k| k > x).unwrap_or(nx - 1);
        let lo = hi - 1;
        let w = (x - knots[lo]) / (knots[hi] - knots[lo]);
        (1.0 - w) * splines[lo].value(y) + w * splines[hi].value(y)
    }
}

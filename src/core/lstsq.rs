//! Least-squares capability used by the orbit fitter
//!
//! The fitter only needs "minimal-norm solution plus residuals for a design
//! matrix and a set of observation columns". Anything that can provide that
//! implements [`LeastSquaresSolver`]; [`HouseholderQr`] is the default backed
//! by nalgebra's QR decomposition.

use crate::types::{InmetError, InmetResult};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array2, Axis};

/// Coefficients and residuals of a least-squares solve
#[derive(Debug, Clone)]
pub struct LeastSquaresSolution {
    /// One column of unknowns per observation column, shape (unknowns, columns)
    pub coefficients: Array2<f64>,
    /// Observation minus model, shape (rows, columns)
    pub residuals: Array2<f64>,
}

impl LeastSquaresSolution {
    /// Root mean square of the residuals of one observation column
    pub fn rms(&self, column: usize) -> f64 {
        let col = self.residuals.column(column);
        let n = col.len();
        if n == 0 {
            return 0.0;
        }
        (col.iter().map(|r| r * r).sum::<f64>() / n as f64).sqrt()
    }
}

/// Solve `design * x = observations` in the least-squares sense, column by column
pub trait LeastSquaresSolver {
    fn solve(
        &self,
        design: &Array2<f64>,
        observations: &Array2<f64>,
    ) -> InmetResult<LeastSquaresSolution>;
}

/// Householder QR factorization, factored once and reused for every column
#[derive(Debug, Clone, Copy, Default)]
pub struct HouseholderQr;

impl LeastSquaresSolver for HouseholderQr {
    fn solve(
        &self,
        design: &Array2<f64>,
        observations: &Array2<f64>,
    ) -> InmetResult<LeastSquaresSolution> {
        let (rows, unknowns) = design.dim();
        let (obs_rows, columns) = observations.dim();

        if obs_rows != rows {
            return Err(InmetError::NumericalFailure(format!(
                "design matrix has {} rows but observations have {}",
                rows, obs_rows
            )));
        }
        if rows < unknowns {
            return Err(InmetError::InsufficientData {
                samples: rows,
                unknowns,
            });
        }
        if design.iter().chain(observations.iter()).any(|v| !v.is_finite()) {
            return Err(InmetError::NumericalFailure(
                "non-finite value in least-squares input".to_string(),
            ));
        }

        let a = DMatrix::from_fn(rows, unknowns, |i, j| design[[i, j]]);
        let qr = a.clone().qr();
        let q = qr.q();
        let r = qr.r();

        check_rank(&r, rows)?;

        let mut coefficients = Array2::<f64>::zeros((unknowns, columns));
        let mut residuals = Array2::<f64>::zeros((rows, columns));

        for (col, obs) in observations.axis_iter(Axis(1)).enumerate() {
            let b = DVector::from_iterator(rows, obs.iter().copied());
            let qtb = q.tr_mul(&b);

            let x = r.solve_upper_triangular(&qtb).ok_or_else(|| {
                InmetError::NumericalFailure("solving of linear system failed".to_string())
            })?;
            if x.iter().any(|v| !v.is_finite()) {
                return Err(InmetError::NumericalFailure(
                    "least-squares solution is not finite".to_string(),
                ));
            }

            let res = &b - &a * &x;
            for i in 0..unknowns {
                coefficients[[i, col]] = x[i];
            }
            for i in 0..rows {
                residuals[[i, col]] = res[i];
            }
        }

        Ok(LeastSquaresSolution {
            coefficients,
            residuals,
        })
    }
}

/// Reject an R factor whose diagonal reveals a rank-deficient design
fn check_rank(r: &DMatrix<f64>, rows: usize) -> InmetResult<()> {
    let diag: Vec<f64> = r.diagonal().iter().map(|d| d.abs()).collect();
    let max_diag = diag.iter().copied().fold(0.0_f64, f64::max);
    let tol = max_diag * rows.max(diag.len()) as f64 * f64::EPSILON;

    if max_diag == 0.0 || diag.iter().any(|&d| d <= tol) {
        return Err(InmetError::NumericalFailure(
            "QR decomposition failed: design matrix is rank deficient".to_string(),
        ));
    }
    Ok(())
}

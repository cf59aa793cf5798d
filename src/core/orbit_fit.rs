use crate::core::lstsq::{HouseholderQr, LeastSquaresSolver};
use crate::core::orbit_model::{Centering, OrbitFitModel};
use crate::types::{Cartesian, InmetError, InmetResult, OrbitSample};
use ndarray::Array2;

/// Per-axis RMS residual (meters) above which a fit is reported as poor
const RESIDUAL_WARN_LIMIT: f64 = 1.0;

/// Orbit polynomial fitting parameters
#[derive(Debug, Clone)]
pub struct FitParams {
    /// Polynomial degree per axis
    pub degree: usize,
    /// Subtract mean time and coordinates before fitting
    pub centered: bool,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            degree: 3,
            centered: true,
        }
    }
}

/// Fits per-axis time polynomials to satellite position samples
pub struct OrbitFitter<S: LeastSquaresSolver = HouseholderQr> {
    params: FitParams,
    solver: S,
}

impl OrbitFitter<HouseholderQr> {
    /// Create a new fitter backed by QR least squares
    pub fn new(params: FitParams) -> Self {
        Self {
            params,
            solver: HouseholderQr,
        }
    }

    /// Create fitter with standard parameters
    pub fn standard() -> Self {
        Self::new(FitParams::default())
    }
}

impl<S: LeastSquaresSolver> OrbitFitter<S> {
    /// Create a fitter with a custom least-squares backend
    pub fn with_solver(params: FitParams, solver: S) -> Self {
        Self { params, solver }
    }

    pub fn params(&self) -> &FitParams {
        &self.params
    }

    /// Fit the orbit polynomials.
    ///
    /// Samples may come in any order. On failure no model is produced.
    pub fn fit(&self, samples: &[OrbitSample]) -> InmetResult<OrbitFitModel> {
        let degree = self.params.degree;
        let n = samples.len();

        if degree == 0 {
            return Err(InmetError::InvalidParameter(
                "polynomial degree must be at least 1".to_string(),
            ));
        }
        let unknowns = degree.checked_add(1).ok_or_else(|| {
            InmetError::InvalidParameter(format!("polynomial degree {} is too large", degree))
        })?;
        if n < unknowns {
            return Err(InmetError::InsufficientData {
                samples: n,
                unknowns,
            });
        }
        if let Some(bad) = samples
            .iter()
            .position(|s| !(s.time.is_finite() && s.position.to_array().iter().all(|v| v.is_finite())))
        {
            return Err(InmetError::InvalidParameter(format!(
                "orbit sample {} contains a non-finite value",
                bad
            )));
        }

        log::info!(
            "Fitting degree {} orbit polynomials to {} samples (centered: {})",
            degree, n, self.params.centered
        );

        let (time_min, time_max) = samples.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), s| (lo.min(s.time), hi.max(s.time)),
        );

        let centering = if self.params.centered {
            let inv = 1.0 / n as f64;
            let (t_sum, c_sum) = samples.iter().fold(
                (0.0, Cartesian::default()),
                |(t, c), s| (t + s.time, c + s.position),
            );
            Some(Centering {
                mean_time: t_sum * inv,
                mean_coords: c_sum * inv,
            })
        } else {
            None
        };

        if let Some(c) = &centering {
            log::debug!(
                "Sample means: t={:.6} coords=[{:.3}, {:.3}, {:.3}]",
                c.mean_time, c.mean_coords.x, c.mean_coords.y, c.mean_coords.z
            );
        }

        let (design, observations) = build_system(samples, degree, centering.as_ref());
        let solution = self.solver.solve(&design, &observations)?;

        let mut coeffs = Vec::with_capacity(3 * unknowns);
        for axis in 0..3 {
            coeffs.extend(solution.coefficients.column(axis).iter().copied());
        }

        let rms = [solution.rms(0), solution.rms(1), solution.rms(2)];
        log::debug!(
            "RMS of residuals (x, y, z) [m]: ({:.6}, {:.6}, {:.6})",
            rms[0], rms[1], rms[2]
        );
        if rms.iter().any(|&r| r > RESIDUAL_WARN_LIMIT) {
            log::warn!(
                "⚠️  Large fit residuals ({:.3}, {:.3}, {:.3}) m, consider another degree",
                rms[0], rms[1], rms[2]
            );
        }

        let model = OrbitFitModel::new(degree, centering, time_min, time_max, coeffs)?
            .with_rms_residuals(rms);

        log::info!(
            "✅ Orbit fit completed over [{:.3}, {:.3}] s",
            time_min, time_max
        );
        Ok(model)
    }
}

/// Design matrix (powers of time) and observation matrix (x, y, z columns)
fn build_system(
    samples: &[OrbitSample],
    degree: usize,
    centering: Option<&Centering>,
) -> (Array2<f64>, Array2<f64>) {
    let n = samples.len();
    let (mean_t, mean_c) = match centering {
        Some(c) => (c.mean_time, c.mean_coords),
        None => (0.0, Cartesian::default()),
    };

    let mut design = Array2::<f64>::zeros((n, degree + 1));
    let mut observations = Array2::<f64>::zeros((n, 3));

    for (i, sample) in samples.iter().enumerate() {
        let t = sample.time - mean_t;
        design[[i, 0]] = 1.0;
        for k in 1..=degree {
            design[[i, k]] = design[[i, k - 1]] * t;
        }

        let p = sample.position - mean_c;
        observations[[i, 0]] = p.x;
        observations[[i, 1]] = p.y;
        observations[[i, 2]] = p.z;
    }

    (design, observations)
}

/// Fit a polynomial orbit of `degree` to `samples`
pub fn fit_orbit(
    samples: &[OrbitSample],
    degree: usize,
    centered: bool,
) -> InmetResult<OrbitFitModel> {
    OrbitFitter::new(FitParams { degree, centered }).fit(samples)
}

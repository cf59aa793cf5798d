use crate::types::{Cartesian, InmetError, InmetResult};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Sample means removed from the data before fitting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Centering {
    pub mean_time: f64,
    pub mean_coords: Cartesian,
}

/// Fitted polynomial trajectory, one polynomial in time per axis.
///
/// Coefficients are stored axis-major, degree ascending:
/// `[x0 .. xd, y0 .. yd, z0 .. zd]`. When the model is centered the
/// polynomials are functions of `t - mean_time` and yield positions
/// relative to `mean_coords`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawOrbitFitModel")]
pub struct OrbitFitModel {
    degree: usize,
    centering: Option<Centering>,
    time_min: f64,
    time_max: f64,
    coeffs: Vec<f64>,
    rms_residuals: Option<[f64; 3]>,
}

impl OrbitFitModel {
    /// Assemble a model from its parts, checking the coefficient layout
    pub fn new(
        degree: usize,
        centering: Option<Centering>,
        time_min: f64,
        time_max: f64,
        coeffs: Vec<f64>,
    ) -> InmetResult<Self> {
        if degree == 0 {
            return Err(InmetError::InvalidParameter(
                "polynomial degree must be at least 1".to_string(),
            ));
        }
        let expected = degree
            .checked_add(1)
            .and_then(|u| u.checked_mul(3))
            .ok_or_else(|| {
                InmetError::InvalidFormat(format!("polynomial degree {} is too large", degree))
            })?;
        if coeffs.len() != expected {
            return Err(InmetError::InvalidFormat(format!(
                "expected {} coefficients for degree {}, got {}",
                expected,
                degree,
                coeffs.len()
            )));
        }
        if !(time_min.is_finite() && time_max.is_finite()) {
            return Err(InmetError::InvalidParameter(format!(
                "time window must be finite, got [{}, {}]",
                time_min, time_max
            )));
        }
        if time_min > time_max {
            return Err(InmetError::InvalidParameter(format!(
                "time window is reversed: t_min {} > t_max {}",
                time_min, time_max
            )));
        }
        if let Some(c) = &centering {
            if !(c.mean_time.is_finite() && c.mean_coords.to_array().iter().all(|v| v.is_finite())) {
                return Err(InmetError::InvalidParameter(
                    "centering means must be finite".to_string(),
                ));
            }
        }
        if coeffs.iter().any(|c| !c.is_finite()) {
            return Err(InmetError::InvalidParameter(
                "polynomial coefficients must be finite".to_string(),
            ));
        }

        Ok(Self {
            degree,
            centering,
            time_min,
            time_max,
            coeffs,
            rms_residuals: None,
        })
    }

    /// Attach the per-axis RMS residuals reported by the fitter
    pub fn with_rms_residuals(mut self, rms: [f64; 3]) -> Self {
        self.rms_residuals = Some(rms);
        self
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn is_centered(&self) -> bool {
        self.centering.is_some()
    }

    pub fn centering(&self) -> Option<&Centering> {
        self.centering.as_ref()
    }

    pub fn time_min(&self) -> f64 {
        self.time_min
    }

    pub fn time_max(&self) -> f64 {
        self.time_max
    }

    /// All coefficients, axis-major and degree ascending
    pub fn coefficients(&self) -> &[f64] {
        &self.coeffs
    }

    /// Coefficients of one axis (0 = x, 1 = y, 2 = z), degree ascending
    pub fn axis_coefficients(&self, axis: usize) -> &[f64] {
        let n = self.degree + 1;
        &self.coeffs[axis * n..(axis + 1) * n]
    }

    /// Per-axis RMS of the fit residuals in meters, when known
    pub fn rms_residuals(&self) -> Option<[f64; 3]> {
        self.rms_residuals
    }

    fn local_time(&self, time: f64) -> f64 {
        match &self.centering {
            Some(c) => time - c.mean_time,
            None => time,
        }
    }

    /// Satellite position at `time`
    pub fn position(&self, time: f64) -> Cartesian {
        let t = self.local_time(time);

        let pos = if self.degree == 1 {
            let (x, y, z) = (
                self.axis_coefficients(0),
                self.axis_coefficients(1),
                self.axis_coefficients(2),
            );
            Cartesian::new(x[0] + x[1] * t, y[0] + y[1] * t, z[0] + z[1] * t)
        } else {
            Cartesian::new(
                horner(self.axis_coefficients(0), t),
                horner(self.axis_coefficients(1), t),
                horner(self.axis_coefficients(2), t),
            )
        };

        match &self.centering {
            Some(c) => pos + c.mean_coords,
            None => pos,
        }
    }

    /// Satellite velocity at `time` (analytic derivative of the position)
    pub fn velocity(&self, time: f64) -> Cartesian {
        if self.degree == 1 {
            return Cartesian::new(
                self.axis_coefficients(0)[1],
                self.axis_coefficients(1)[1],
                self.axis_coefficients(2)[1],
            );
        }

        let t = self.local_time(time);
        Cartesian::new(
            horner_derivative(self.axis_coefficients(0), t),
            horner_derivative(self.axis_coefficients(1), t),
            horner_derivative(self.axis_coefficients(2), t),
        )
    }

    /// Positions at each of `times`, one `[x, y, z]` row per time
    pub fn evaluate(&self, times: &[f64]) -> Array2<f64> {
        let mut out = Array2::<f64>::zeros((times.len(), 3));
        for (mut row, &t) in out.rows_mut().into_iter().zip(times) {
            let p = self.position(t);
            row[0] = p.x;
            row[1] = p.y;
            row[2] = p.z;
        }
        out
    }

    /// Positions at `nstep + 1` evenly spaced epochs covering `[t_min, t_max]`
    pub fn sample_trajectory(&self, nstep: usize) -> InmetResult<Vec<(f64, Cartesian)>> {
        if nstep == 0 {
            return Err(InmetError::InvalidParameter(
                "number of steps must be positive".to_string(),
            ));
        }

        let dstep = (self.time_max - self.time_min) / nstep as f64;
        Ok((0..=nstep)
            .map(|i| {
                let t = self.time_min + i as f64 * dstep;
                (t, self.position(t))
            })
            .collect())
    }
}

/// Evaluate the fitted trajectory at every time in `times`
pub fn evaluate_orbit(model: &OrbitFitModel, times: &[f64]) -> Array2<f64> {
    model.evaluate(times)
}

/// Unchecked field layout of a serialized model
#[derive(Deserialize)]
struct RawOrbitFitModel {
    degree: usize,
    centering: Option<Centering>,
    time_min: f64,
    time_max: f64,
    coeffs: Vec<f64>,
    rms_residuals: Option<[f64; 3]>,
}

impl TryFrom<RawOrbitFitModel> for OrbitFitModel {
    type Error = InmetError;

    fn try_from(raw: RawOrbitFitModel) -> InmetResult<Self> {
        let model = Self::new(raw.degree, raw.centering, raw.time_min, raw.time_max, raw.coeffs)?;
        Ok(match raw.rms_residuals {
            Some(rms) => model.with_rms_residuals(rms),
            None => model,
        })
    }
}

/// Horner evaluation of an ascending-order coefficient slice
fn horner(coeffs: &[f64], t: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * t + c)
}

/// Horner evaluation of the first derivative of an ascending-order polynomial
fn horner_derivative(coeffs: &[f64], t: f64) -> f64 {
    coeffs
        .iter()
        .enumerate()
        .skip(1)
        .rev()
        .fold(0.0, |acc, (k, &c)| acc * t + k as f64 * c)
}

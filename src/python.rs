//! Python module definition

use crate::core::{compute_geometry, fit_orbit as fit_orbit_core, OrbitFitModel};
use crate::io::{read_fit_file, write_fit_file};
use crate::types::{CoordinateMode, InmetError, OrbitSample};
use numpy::{IntoPyArray, PyArray2, PyReadonlyArray1, PyReadonlyArray2};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

fn to_py_err(e: InmetError) -> PyErr {
    match e {
        InmetError::InvalidMode(_)
        | InmetError::InvalidParameter(_)
        | InmetError::InvalidFormat(_) => PyValueError::new_err(e.to_string()),
        _ => PyRuntimeError::new_err(e.to_string()),
    }
}

#[pymodule]
fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyOrbitFit>()?;
    m.add_function(wrap_pyfunction!(fit_orbit, m)?)?;
    m.add_function(wrap_pyfunction!(load_fit, m)?)?;
    Ok(())
}

/// Fit orbit polynomials to an `(n, 4)` array of `t, x, y, z` rows
#[pyfunction]
fn fit_orbit(samples: PyReadonlyArray2<'_, f64>, deg: usize, centered: bool) -> PyResult<PyOrbitFit> {
    let samples = samples.as_array();
    if samples.ncols() != 4 {
        return Err(PyValueError::new_err(format!(
            "orbit samples need 4 columns (t, x, y, z), got {}",
            samples.ncols()
        )));
    }

    let records: Vec<OrbitSample> = samples
        .rows()
        .into_iter()
        .map(|r| OrbitSample::new(r[0], r[1], r[2], r[3]))
        .collect();

    let inner = fit_orbit_core(&records, deg, centered).map_err(to_py_err)?;
    Ok(PyOrbitFit { inner })
}

/// Load a fit record written by `OrbitFit.save`
#[pyfunction]
fn load_fit(path: String) -> PyResult<PyOrbitFit> {
    let inner = read_fit_file(&path).map_err(to_py_err)?;
    Ok(PyOrbitFit { inner })
}

/// Python wrapper for OrbitFitModel
#[pyclass(name = "OrbitFit")]
struct PyOrbitFit {
    inner: OrbitFitModel,
}

#[pymethods]
impl PyOrbitFit {
    #[getter]
    fn deg(&self) -> usize {
        self.inner.degree()
    }

    #[getter]
    fn centered(&self) -> bool {
        self.inner.is_centered()
    }

    #[getter]
    fn time_window(&self) -> (f64, f64) {
        (self.inner.time_min(), self.inner.time_max())
    }

    #[getter]
    fn coeffs(&self) -> Vec<f64> {
        self.inner.coefficients().to_vec()
    }

    #[getter]
    fn rms_residuals(&self) -> Option<(f64, f64, f64)> {
        self.inner.rms_residuals().map(|[x, y, z]| (x, y, z))
    }

    /// Positions at `times`, shape `(n, 3)`
    fn evaluate<'py>(&self, py: Python<'py>, times: PyReadonlyArray1<'_, f64>) -> &'py PyArray2<f64> {
        let times: Vec<f64> = times.as_array().iter().copied().collect();
        self.inner.evaluate(&times).into_pyarray(py)
    }

    /// Azimuth and incidence in degrees, shape `(n, 2)`
    fn azi_inc<'py>(
        &self,
        py: Python<'py>,
        coords: PyReadonlyArray2<'_, f64>,
        mode: &str,
        max_iter: usize,
    ) -> PyResult<&'py PyArray2<f64>> {
        let mode: CoordinateMode = mode.parse().map_err(to_py_err)?;
        let angles = compute_geometry(&self.inner, coords.as_array(), mode, max_iter)
            .map_err(to_py_err)?;
        Ok(angles.into_pyarray(py))
    }

    fn save(&self, path: String) -> PyResult<()> {
        write_fit_file(&path, &self.inner).map_err(to_py_err)
    }

    fn __repr__(&self) -> String {
        format!(
            "OrbitFit(deg={}, centered={}, t_min={}, t_max={})",
            self.inner.degree(),
            self.inner.is_centered(),
            self.inner.time_min(),
            self.inner.time_max()
        )
    }
}

//! Text record holding a fitted orbit
//!
//! ```text
//! centered: 1
//! t_mean: 43200.5
//! coords_mean: 4123456.7 1234567.8 4987654.3
//! t_min: 43170
//! t_max: 43231
//! deg: 3
//! coeffs: x0 x1 x2 x3 y0 y1 y2 y3 z0 z1 z2 z3
//! RMS of residuals (x, y, z) [m]: (0.012, 0.009, 0.011)
//! ```

use crate::core::orbit_model::{Centering, OrbitFitModel};
use crate::types::{Cartesian, InmetError, InmetResult};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

const RMS_KEY: &str = "RMS of residuals (x, y, z) [m]";

/// Render a model as a fit record
pub fn format_fit_record(model: &OrbitFitModel) -> String {
    let mut out = String::new();

    // writing into a String cannot fail
    let _ = writeln!(out, "centered: {}", u8::from(model.is_centered()));
    if let Some(c) = model.centering() {
        let _ = writeln!(out, "t_mean: {}", c.mean_time);
        let _ = writeln!(
            out,
            "coords_mean: {} {} {}",
            c.mean_coords.x, c.mean_coords.y, c.mean_coords.z
        );
    }
    let _ = writeln!(out, "t_min: {}", model.time_min());
    let _ = writeln!(out, "t_max: {}", model.time_max());
    let _ = writeln!(out, "deg: {}", model.degree());

    let coeffs: Vec<String> = model.coefficients().iter().map(|c| c.to_string()).collect();
    let _ = writeln!(out, "coeffs: {}", coeffs.join(" "));

    if let Some([rx, ry, rz]) = model.rms_residuals() {
        let _ = writeln!(out, "{}: ({}, {}, {})", RMS_KEY, rx, ry, rz);
    }
    out
}

/// Write a fit record to `path`
pub fn write_fit_file<P: AsRef<Path>>(path: P, model: &OrbitFitModel) -> InmetResult<()> {
    log::info!("Writing orbit fit: {}", path.as_ref().display());
    fs::write(path, format_fit_record(model))?;
    Ok(())
}

/// Read a fit record from `path`
pub fn read_fit_file<P: AsRef<Path>>(path: P) -> InmetResult<OrbitFitModel> {
    log::info!("Reading orbit fit: {}", path.as_ref().display());
    let content = fs::read_to_string(&path)?;
    parse_fit_record(&content)
}

/// Parse a fit record. Keys may come in any order; unknown keys are ignored.
pub fn parse_fit_record(content: &str) -> InmetResult<OrbitFitModel> {
    let fields: HashMap<&str, &str> = content
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect();

    let centered = match required(&fields, "centered")? {
        "0" => false,
        "1" => true,
        other => {
            return Err(InmetError::InvalidFormat(format!(
                "centered must be 0 or 1, got '{}'",
                other
            )))
        }
    };

    let degree: usize = required(&fields, "deg")?
        .parse()
        .map_err(|e| InmetError::InvalidFormat(format!("deg: {}", e)))?;

    let centering = if centered {
        let mean_time = parse_scalar(required(&fields, "t_mean")?, "t_mean")?;
        let mean = parse_values(required(&fields, "coords_mean")?, "coords_mean")?;
        if mean.len() != 3 {
            return Err(InmetError::InvalidFormat(format!(
                "coords_mean needs 3 values, got {}",
                mean.len()
            )));
        }
        Some(Centering {
            mean_time,
            mean_coords: Cartesian::new(mean[0], mean[1], mean[2]),
        })
    } else {
        None
    };

    let time_min = parse_scalar(required(&fields, "t_min")?, "t_min")?;
    let time_max = parse_scalar(required(&fields, "t_max")?, "t_max")?;
    let coeffs = parse_values(required(&fields, "coeffs")?, "coeffs")?;

    let model = OrbitFitModel::new(degree, centering, time_min, time_max, coeffs)?;

    match fields.get(RMS_KEY) {
        Some(value) => {
            let rms = parse_values(value.trim_matches(|c| c == '(' || c == ')'), "RMS")?;
            if rms.len() != 3 {
                return Err(InmetError::InvalidFormat(format!(
                    "RMS of residuals needs 3 values, got {}",
                    rms.len()
                )));
            }
            Ok(model.with_rms_residuals([rms[0], rms[1], rms[2]]))
        }
        None => Ok(model),
    }
}

fn required<'a>(fields: &HashMap<&str, &'a str>, key: &str) -> InmetResult<&'a str> {
    fields
        .get(key)
        .copied()
        .ok_or_else(|| InmetError::InvalidFormat(format!("missing '{}' in fit record", key)))
}

fn parse_scalar(value: &str, key: &str) -> InmetResult<f64> {
    let v: f64 = value
        .parse()
        .map_err(|e| InmetError::InvalidFormat(format!("{}: {}", key, e)))?;
    if !v.is_finite() {
        return Err(InmetError::InvalidFormat(format!("{}: non-finite value '{}'", key, value)));
    }
    Ok(v)
}

fn parse_values(value: &str, key: &str) -> InmetResult<Vec<f64>> {
    value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| parse_scalar(s, key))
        .collect()
}

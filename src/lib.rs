//! inmet: satellite orbit fitting and radar viewing geometry
//!
//! Fits smooth polynomial trajectories to discrete satellite positions and
//! derives, for arbitrary ground points, the closest-approach satellite
//! position and the radar look angles (azimuth, incidence) seen from there.

pub mod types;
pub mod core;
pub mod io;

#[cfg(feature = "python")]
mod python;

// Re-export main types and functions for easier access
pub use crate::types::{
    Cartesian, Geodetic, OrbitSample, GroundPoint, CoordinateMode, GeometryResult,
    InmetError, InmetResult,
};

pub use crate::core::{
    fit_orbit, evaluate_orbit, compute_geometry, OrbitFitModel, OrbitFitter, FitParams,
    GeometryEngine, ApproachParams, ClosestApproach,
};

pub use crate::io::{OrbitReader, read_fit_file, write_fit_file};

//! Core orbit and viewing-geometry modules

pub mod ellipsoid;
pub mod lstsq;
pub mod orbit_model;
pub mod orbit_fit;
pub mod closest_approach;
pub mod geometry;

// Re-export main types
pub use ellipsoid::{cartesian_to_ellipsoidal, ellipsoidal_to_cartesian};
pub use lstsq::{HouseholderQr, LeastSquaresSolution, LeastSquaresSolver};
pub use orbit_model::{evaluate_orbit, Centering, OrbitFitModel};
pub use orbit_fit::{fit_orbit, FitParams, OrbitFitter};
pub use closest_approach::{closest_approach, ApproachParams, ClosestApproach};
pub use geometry::{compute_geometry, GeometryEngine};

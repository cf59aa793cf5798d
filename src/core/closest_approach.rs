//! Closest-approach search along a fitted trajectory
//!
//! The point of closest approach is where the satellite-to-ground vector is
//! perpendicular to the satellite velocity. The normalized dot product of the
//! two changes sign across that epoch, so a bisection on its sign over the
//! (slightly widened) fit window brackets the root.

use crate::core::orbit_model::OrbitFitModel;
use crate::types::{Cartesian, InmetError, InmetResult};

/// Default widening of the fit window on both ends (seconds)
pub const DEFAULT_TIME_MARGIN: f64 = 5.0;

/// Default stopping threshold on the normalized dot product
pub const DEFAULT_TOLERANCE: f64 = 1.0e-11;

/// Closest-approach search parameters
#[derive(Debug, Clone)]
pub struct ApproachParams {
    /// Maximum number of bisection steps
    pub max_iter: usize,
    /// Extrapolation allowed past both ends of the fit window (seconds)
    pub time_margin: f64,
    /// Stop once the normalized dot product is at most this in magnitude
    pub tolerance: f64,
}

impl ApproachParams {
    /// Standard window margin and tolerance with a caller-chosen iteration budget
    pub fn new(max_iter: usize) -> Self {
        Self {
            max_iter,
            time_margin: DEFAULT_TIME_MARGIN,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn validate(&self) -> InmetResult<()> {
        if self.max_iter == 0 {
            return Err(InmetError::InvalidParameter(
                "max_iter must be positive".to_string(),
            ));
        }
        if !(self.time_margin.is_finite() && self.time_margin >= 0.0) {
            return Err(InmetError::InvalidParameter(format!(
                "time margin must be a non-negative number, got {}",
                self.time_margin
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(InmetError::InvalidParameter(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Outcome of a closest-approach search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestApproach {
    /// Epoch of closest approach (same time base as the fit)
    pub time: f64,
    /// Satellite position at `time`
    pub position: Cartesian,
    /// Bisection steps taken
    pub iterations: usize,
    /// Normalized dot product at `time`
    pub dot: f64,
}

impl ClosestApproach {
    /// Whether the search met `tolerance`
    pub fn converged(&self, tolerance: f64) -> bool {
        self.dot.abs() <= tolerance
    }
}

/// Cosine of the angle between the satellite velocity and the
/// satellite-to-ground offset at `time`
pub fn look_dot_product(model: &OrbitFitModel, ground: &Cartesian, time: f64) -> f64 {
    let offset = model.position(time) - *ground;
    let velocity = model.velocity(time);

    let norms = offset.norm() * velocity.norm();
    if norms == 0.0 {
        return 0.0;
    }
    velocity.dot(&offset) / norms
}

/// Find the trajectory point closest to `ground` by bisection.
///
/// Never fails on geometry: if the dot product does not change sign inside
/// the bracket the search runs out of iterations near one of its ends and the
/// best estimate is returned.
pub fn closest_approach(
    model: &OrbitFitModel,
    ground: &Cartesian,
    params: &ApproachParams,
) -> ClosestApproach {
    let mut t_lo = model.time_min() - params.time_margin;
    let mut t_hi = model.time_max() + params.time_margin;

    let mut dot_lo = look_dot_product(model, ground, t_lo);
    let mut t_mid = 0.5 * (t_lo + t_hi);
    let mut dot_mid = f64::NAN;
    let mut iterations = 0;

    while iterations < params.max_iter {
        t_mid = 0.5 * (t_lo + t_hi);
        dot_mid = look_dot_product(model, ground, t_mid);
        iterations += 1;

        if dot_mid.abs() <= params.tolerance {
            break;
        }

        if dot_lo * dot_mid > 0.0 {
            t_lo = t_mid;
            dot_lo = dot_mid;
        } else {
            t_hi = t_mid;
        }
    }

    if dot_mid.is_nan() {
        dot_mid = look_dot_product(model, ground, t_mid);
    }

    ClosestApproach {
        time: t_mid,
        position: model.position(t_mid),
        iterations,
        dot: dot_mid,
    }
}

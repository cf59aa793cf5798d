use crate::core::closest_approach::{closest_approach, ApproachParams, ClosestApproach};
use crate::core::ellipsoid::{cartesian_to_ellipsoidal, ellipsoidal_to_cartesian};
use crate::core::orbit_model::OrbitFitModel;
use crate::types::{
    Cartesian, CoordinateMode, Geodetic, GeometryResult, GroundPoint, InmetError, InmetResult,
};
use ndarray::{Array2, ArrayView2};
use std::f64::consts::PI;

/// Replaces an exactly zero northing before the azimuth division
const AZIMUTH_EPSILON: f64 = 1.0e-9;

/// Radar look-angle calculator for one fitted orbit
pub struct GeometryEngine<'a> {
    model: &'a OrbitFitModel,
    params: ApproachParams,
}

impl<'a> GeometryEngine<'a> {
    /// Create an engine with the standard search window and tolerance
    pub fn new(model: &'a OrbitFitModel, max_iter: usize) -> InmetResult<Self> {
        Self::with_params(model, ApproachParams::new(max_iter))
    }

    pub fn with_params(model: &'a OrbitFitModel, params: ApproachParams) -> InmetResult<Self> {
        params.validate()?;
        Ok(Self { model, params })
    }

    pub fn params(&self) -> &ApproachParams {
        &self.params
    }

    /// Satellite closest approach for a ground point
    pub fn closest_approach(&self, point: &GroundPoint) -> ClosestApproach {
        let (cart, _) = resolve(point);
        closest_approach(self.model, &cart, &self.params)
    }

    /// Azimuth and incidence angle of a single ground point
    pub fn look_angles(&self, point: &GroundPoint) -> GeometryResult {
        let (result, converged) = self.solve_point(point);
        if !converged {
            log::warn!("Closest approach search exhausted {} iterations", self.params.max_iter);
        }
        result
    }

    /// Look angles for many points, in input order
    pub fn look_angles_batch(&self, points: &[GroundPoint]) -> Vec<GeometryResult> {
        log::info!("Computing look angles for {} ground points", points.len());

        let (results, unconverged) = self.solve_batch(points);
        if unconverged > 0 {
            log::warn!(
                "⚠️  Closest approach did not converge for {} of {} ground points",
                unconverged,
                points.len()
            );
        }
        results
    }

    /// Angles plus the number of points whose search hit `max_iter`
    fn solve_batch(&self, points: &[GroundPoint]) -> (Vec<GeometryResult>, usize) {
        #[cfg(feature = "parallel")]
        let solved: Vec<(GeometryResult, bool)> = {
            use rayon::prelude::*;
            points.par_iter().map(|p| self.solve_point(p)).collect()
        };

        #[cfg(not(feature = "parallel"))]
        let solved: Vec<(GeometryResult, bool)> = points.iter().map(|p| self.solve_point(p)).collect();

        let unconverged = solved.iter().filter(|(_, converged)| !converged).count();
        (solved.into_iter().map(|(r, _)| r).collect(), unconverged)
    }

    fn solve_point(&self, point: &GroundPoint) -> (GeometryResult, bool) {
        let (ground, geo) = resolve(point);
        let approach = closest_approach(self.model, &ground, &self.params);

        let converged = approach.converged(self.params.tolerance);
        if !converged {
            log::debug!(
                "Closest approach not converged after {} iterations (dot = {:.3e}, t = {:.6})",
                approach.iterations, approach.dot, approach.time
            );
        }

        let result = azimuth_incidence(&(approach.position - ground), geo.lon, geo.lat);
        (result, converged)
    }

    /// Look angles for a `(n, 3)` coordinate array, returning `(n, 2)`
    /// rows of `(azimuth, incidence)` in degrees.
    ///
    /// In `Llh` mode the first two columns are longitude and latitude in
    /// degrees and the third is height in meters; in `Xyz` mode all three are
    /// geocentric meters.
    pub fn compute_array(
        &self,
        coords: ArrayView2<f64>,
        mode: CoordinateMode,
    ) -> InmetResult<Array2<f64>> {
        if coords.ncols() != 3 {
            return Err(InmetError::InvalidFormat(format!(
                "ground coordinates need 3 columns, got {}",
                coords.ncols()
            )));
        }

        let points: Vec<GroundPoint> = coords
            .rows()
            .into_iter()
            .map(|row| match mode {
                CoordinateMode::Llh => {
                    GroundPoint::Geodetic(Geodetic::from_degrees(row[0], row[1], row[2]))
                }
                CoordinateMode::Xyz => GroundPoint::Cartesian(Cartesian::new(row[0], row[1], row[2])),
            })
            .collect();

        let results = self.look_angles_batch(&points);

        let mut out = Array2::<f64>::zeros((results.len(), 2));
        for (i, r) in results.iter().enumerate() {
            out[[i, 0]] = r.azimuth;
            out[[i, 1]] = r.incidence;
        }
        Ok(out)
    }
}

/// Azimuth and incidence for every row of `coords`
pub fn compute_geometry(
    model: &OrbitFitModel,
    coords: ArrayView2<f64>,
    mode: CoordinateMode,
    max_iter: usize,
) -> InmetResult<Array2<f64>> {
    GeometryEngine::new(model, max_iter)?.compute_array(coords, mode)
}

/// Both representations of a ground point
fn resolve(point: &GroundPoint) -> (Cartesian, Geodetic) {
    match point {
        GroundPoint::Geodetic(geo) => (ellipsoidal_to_cartesian(geo), *geo),
        GroundPoint::Cartesian(cart) => (*cart, cartesian_to_ellipsoidal(cart)),
    }
}

/// Rotate a line-of-sight vector into the local frame at `(lon, lat)`
/// returning `(north, east, up)` components.
pub fn to_local_frame(los: &Cartesian, lon: f64, lat: f64) -> (f64, f64, f64) {
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();

    let xl = -sin_lat * cos_lon * los.x - sin_lat * sin_lon * los.y + cos_lat * los.z;
    let yl = -sin_lon * los.x + cos_lon * los.y;
    let zl = cos_lat * cos_lon * los.x + cos_lat * sin_lon * los.y + sin_lat * los.z;

    (xl, yl, zl)
}

/// Azimuth and incidence of a ground-to-satellite vector at `(lon, lat)`
pub fn azimuth_incidence(los: &Cartesian, lon: f64, lat: f64) -> GeometryResult {
    let (xl, yl, zl) = to_local_frame(los, lon, lat);
    local_look_angles(xl, yl, zl)
}

/// Look angles from local-frame components.
///
/// The azimuth is flipped by 180 degrees so it points along the look
/// direction rather than toward the satellite.
pub fn local_look_angles(xl: f64, yl: f64, zl: f64) -> GeometryResult {
    let range = (xl * xl + yl * yl + zl * zl).sqrt();
    let incidence = (zl / range).acos().to_degrees();

    let xl = if xl == 0.0 { AZIMUTH_EPSILON } else { xl };

    let mut azi = (yl / xl).abs().atan();
    if xl < 0.0 && yl > 0.0 {
        azi = PI - azi;
    }
    if xl < 0.0 && yl < 0.0 {
        azi = PI + azi;
    }
    if xl > 0.0 && yl < 0.0 {
        azi = 2.0 * PI - azi;
    }

    let mut azimuth = azi.to_degrees();
    if azimuth > 180.0 {
        azimuth -= 180.0;
    } else {
        azimuth += 180.0;
    }

    GeometryResult { azimuth, incidence }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_quadrant_branches() {
        let q1 = local_look_angles(1.0, 1.0, 1.0);
        let q2 = local_look_angles(-1.0, 1.0, 1.0);
        let q3 = local_look_angles(-1.0, -1.0, 1.0);
        let q4 = local_look_angles(1.0, -1.0, 1.0);

        assert_abs_diff_eq!(q1.azimuth, 225.0, epsilon = 1e-9);
        assert_abs_diff_eq!(q2.azimuth, 315.0, epsilon = 1e-9);
        assert_abs_diff_eq!(q3.azimuth, 45.0, epsilon = 1e-9);
        assert_abs_diff_eq!(q4.azimuth, 135.0, epsilon = 1e-9);
    }

    #[test]
    fn test_continuity_across_north_axis() {
        let above = local_look_angles(1.0, 1e-8, 1.0);
        let below = local_look_angles(1.0, -1e-8, 1.0);
        let on = local_look_angles(1.0, 0.0, 1.0);

        assert_abs_diff_eq!(above.azimuth, 180.0, epsilon = 1e-5);
        assert_abs_diff_eq!(below.azimuth, 180.0, epsilon = 1e-5);
        assert_abs_diff_eq!(on.azimuth, 180.0, epsilon = 1e-12);
    }

    #[test]
    fn test_continuity_across_east_axis() {
        // xl == 0 is nudged to a tiny positive value
        let on_east = local_look_angles(0.0, 1.0, 1.0);
        let left = local_look_angles(-1e-8, 1.0, 1.0);
        let right = local_look_angles(1e-8, 1.0, 1.0);

        assert_abs_diff_eq!(on_east.azimuth, 270.0, epsilon = 1e-5);
        assert_abs_diff_eq!(left.azimuth, 270.0, epsilon = 1e-5);
        assert_abs_diff_eq!(right.azimuth, 270.0, epsilon = 1e-5);

        let on_west = local_look_angles(0.0, -1.0, 1.0);
        assert_abs_diff_eq!(on_west.azimuth, 90.0, epsilon = 1e-5);
    }

    #[test]
    fn test_incidence_zenith_and_horizon() {
        assert_abs_diff_eq!(local_look_angles(0.0, 0.0, 5.0).incidence, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(local_look_angles(3.0, 4.0, 0.0).incidence, 90.0, epsilon = 1e-12);
        assert_abs_diff_eq!(local_look_angles(1.0, 0.0, 1.0).incidence, 45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_local_frame_at_origin() {
        // at lon = lat = 0 the local up is +X, north is +Z, east is +Y
        let (n, e, u) = to_local_frame(&Cartesian::new(1.0, 2.0, 3.0), 0.0, 0.0);
        assert_abs_diff_eq!(n, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(e, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(u, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_array_shape_checked() {
        let model = OrbitFitModel::new(1, None, 0.0, 1.0, vec![7.0e6, 0.0, 0.0, 7500.0, 0.0, 0.0])
            .unwrap();
        let coords = array![[1.0, 2.0], [3.0, 4.0]];

        let result = compute_geometry(&model, coords.view(), CoordinateMode::Llh, 50);
        assert!(matches!(result, Err(InmetError::InvalidFormat(_))));
    }

    #[test]
    fn test_batch_counts_unconverged_points() {
        // track along +Z above lon 0, lat 0
        let model = OrbitFitModel::new(
            1,
            None,
            -60.0,
            60.0,
            vec![7.0e6, 0.0, 0.0, 0.0, 0.0, 7500.0],
        )
        .unwrap();
        let points: Vec<GroundPoint> = (0..7)
            .map(|i| GroundPoint::Geodetic(Geodetic::from_degrees(0.5 + 0.1 * i as f64, 0.3, 0.0)))
            .collect();

        let starved = GeometryEngine::new(&model, 2).unwrap();
        let (results, unconverged) = starved.solve_batch(&points);
        assert_eq!(results.len(), 7);
        assert_eq!(unconverged, 7);

        let engine = GeometryEngine::new(&model, 1000).unwrap();
        let (results, unconverged) = engine.solve_batch(&points);
        assert_eq!(unconverged, 0);
        for (point, result) in points.iter().zip(&results) {
            assert_eq!(*result, engine.look_angles(point));
        }
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let model = OrbitFitModel::new(1, None, 0.0, 1.0, vec![7.0e6, 0.0, 0.0, 7500.0, 0.0, 0.0])
            .unwrap();
        assert!(GeometryEngine::new(&model, 0).is_err());
    }
}

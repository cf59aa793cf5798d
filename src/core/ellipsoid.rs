//! WGS-84 ellipsoidal <-> geocentric Cartesian conversion

use crate::types::{Cartesian, Geodetic};
use std::f64::consts::{FRAC_PI_2, PI};

/// WGS-84 semi-major axis (m)
pub const WA: f64 = 6_378_137.0;
/// WGS-84 semi-minor axis (m)
pub const WB: f64 = 6_356_752.3142;
/// First eccentricity squared, (WA^2 - WB^2) / WA^2
pub const E2: f64 = 6.694380e-03;

/// Convert ellipsoidal coordinates (radians, meters) to geocentric Cartesian
pub fn ellipsoidal_to_cartesian(point: &Geodetic) -> Cartesian {
    let (sin_lat, cos_lat) = point.lat.sin_cos();
    let (sin_lon, cos_lon) = point.lon.sin_cos();

    let n = WA / (1.0 - E2 * sin_lat * sin_lat).sqrt();

    Cartesian::new(
        (n + point.h) * cos_lat * cos_lon,
        (n + point.h) * cos_lat * sin_lon,
        ((1.0 - E2) * n + point.h) * sin_lat,
    )
}

/// Convert geocentric Cartesian coordinates to ellipsoidal ones.
///
/// Closed-form Bowring approximation: the auxiliary angle is seeded from the
/// ratio of axes and refined exactly once. Not defined on the polar axis.
pub fn cartesian_to_ellipsoidal(point: &Cartesian) -> Geodetic {
    let Cartesian { x, y, z } = *point;
    let ep = WA * WA - WB * WB;
    let p = (x * x + y * y).sqrt();

    let omega = (WA * z / (p * WB)).atan();
    let (so, co) = omega.sin_cos();

    let omega = ((z + ep / WB * so * so * so) / (p - ep / WA * co * co * co)).atan();
    let (so, co) = omega.sin_cos();

    let n = WA * WA / (WA * WA * co * co + WB * WB * so * so).sqrt();

    Geodetic {
        lon: longitude(x, y),
        lat: omega,
        h: p / co - n,
    }
}

fn longitude(x: f64, y: f64) -> f64 {
    let mut lon = if x == 0.0 {
        if y < 0.0 {
            -FRAC_PI_2
        } else if y > 0.0 {
            FRAC_PI_2
        } else {
            0.0
        }
    } else {
        (y / x).atan()
    };

    if x < 0.0 {
        lon += PI;
    }

    // keep within (-pi, pi]
    if lon > PI {
        lon -= 2.0 * PI;
    }
    lon
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_equator_prime_meridian() {
        let cart = ellipsoidal_to_cartesian(&Geodetic::new(0.0, 0.0, 0.0));
        assert_abs_diff_eq!(cart.x, WA, epsilon = 1e-6);
        assert_abs_diff_eq!(cart.y, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(cart.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_longitude_quadrants() {
        assert_abs_diff_eq!(longitude(1.0, 1.0), PI / 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(longitude(-1.0, 1.0), 3.0 * PI / 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(longitude(-1.0, -1.0), -3.0 * PI / 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(longitude(1.0, -1.0), -PI / 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(longitude(-1.0, 0.0), PI, epsilon = 1e-12);
    }

    #[test]
    fn test_longitude_on_y_axis() {
        assert_abs_diff_eq!(longitude(0.0, 5.0), FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(longitude(0.0, -5.0), -FRAC_PI_2, epsilon = 1e-12);

        let back = cartesian_to_ellipsoidal(&Cartesian::new(0.0, 6_400_000.0, 10_000.0));
        assert!(back.lon.is_finite());
        assert_abs_diff_eq!(back.lon, FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_round_trip_single_point() {
        let original = Geodetic::from_degrees(19.04, 47.5, 120.0);
        let back = cartesian_to_ellipsoidal(&ellipsoidal_to_cartesian(&original));

        assert_abs_diff_eq!(back.lon, original.lon, epsilon = 1e-10);
        assert_abs_diff_eq!(back.lat, original.lat, epsilon = 1e-9);
        assert_abs_diff_eq!(back.h, original.h, epsilon = 1e-3);
    }
}

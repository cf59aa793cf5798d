use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

/// Geocentric Cartesian coordinates in meters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cartesian {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Cartesian {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, other: &Cartesian) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Cartesian {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl Add for Cartesian {
    type Output = Cartesian;

    fn add(self, rhs: Cartesian) -> Cartesian {
        Cartesian::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Cartesian {
    type Output = Cartesian;

    fn sub(self, rhs: Cartesian) -> Cartesian {
        Cartesian::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Cartesian {
    type Output = Cartesian;

    fn mul(self, rhs: f64) -> Cartesian {
        Cartesian::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// WGS-84 ellipsoidal coordinates (radians, radians, meters)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geodetic {
    pub lon: f64,
    pub lat: f64,
    pub h: f64,
}

impl Geodetic {
    pub const fn new(lon: f64, lat: f64, h: f64) -> Self {
        Self { lon, lat, h }
    }

    /// Build from longitude/latitude given in degrees
    pub fn from_degrees(lon_deg: f64, lat_deg: f64, h: f64) -> Self {
        Self::new(lon_deg.to_radians(), lat_deg.to_radians(), h)
    }
}

/// One observed satellite position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitSample {
    /// Seconds from an arbitrary epoch
    pub time: f64,
    pub position: Cartesian,
}

impl OrbitSample {
    pub fn new(time: f64, x: f64, y: f64, z: f64) -> Self {
        Self {
            time,
            position: Cartesian::new(x, y, z),
        }
    }
}

/// Ground point in either of its two equivalent representations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GroundPoint {
    Geodetic(Geodetic),
    Cartesian(Cartesian),
}

/// Layout of a row of ground coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoordinateMode {
    /// Longitude and latitude in degrees, ellipsoidal height in meters
    Llh,
    /// Geocentric X, Y, Z in meters
    Xyz,
}

impl std::fmt::Display for CoordinateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordinateMode::Llh => write!(f, "llh"),
            CoordinateMode::Xyz => write!(f, "xyz"),
        }
    }
}

impl FromStr for CoordinateMode {
    type Err = InmetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "llh" => Ok(CoordinateMode::Llh),
            "xyz" => Ok(CoordinateMode::Xyz),
            _ => Err(InmetError::InvalidMode(format!(
                "expected llh or xyz, got '{}'", s
            ))),
        }
    }
}

/// Radar look angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryResult {
    pub azimuth: f64,
    pub incidence: f64,
}

/// Error types for orbit fitting and geometry
#[derive(Debug, thiserror::Error)]
pub enum InmetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Underdetermined system: {samples} data points for {unknowns} unknowns")]
    InsufficientData { samples: usize, unknowns: usize },

    #[error("Numerical error: {0}")]
    NumericalFailure(String),

    #[error("Invalid coordinate mode: {0}")]
    InvalidMode(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

/// Result type for orbit and geometry operations
pub type InmetResult<T> = Result<T, InmetError>;

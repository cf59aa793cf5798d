//! I/O modules for orbit samples, fit records, and ground-point records

pub mod orbit;
pub mod fit_record;
pub mod coords;

pub use orbit::{parse_orbit_samples, write_positions, OrbitReader};
pub use fit_record::{format_fit_record, parse_fit_record, read_fit_file, write_fit_file};
pub use coords::{read_coordinate_records, write_geometry_records};

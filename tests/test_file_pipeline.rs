use approx::assert_abs_diff_eq;
use inmet::core::{FitParams, GeometryEngine, OrbitFitter};
use inmet::io::{
    read_coordinate_records, read_fit_file, write_fit_file, write_geometry_records,
    write_positions, OrbitReader,
};
use inmet::types::{CoordinateMode, InmetError};
use std::fs::{self, File};
use std::io::{BufReader, Write};
use tempfile::TempDir;

/// Cubic pass over (lon 0, lat 0) sampled every 10 s
fn write_orbit_file(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("orbit.txt");
    let mut file = File::create(&path).unwrap();
    writeln!(file, "# t x y z").unwrap();
    for i in 0..13 {
        let t = 43_170.0 + i as f64 * 10.0;
        let dt = t - 43_230.0;
        writeln!(
            file,
            "{} {} {} {}",
            t,
            6_900_000.0 - 3.9 * dt * dt,
            -1_200.0 * dt,
            7_400.0 * dt - 0.01 * dt * dt * dt
        )
        .unwrap();
    }
    path
}

#[test]
fn test_fit_file_round_trip() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new().unwrap();

    let samples = OrbitReader::read_samples(write_orbit_file(&dir)).unwrap();
    assert_eq!(samples.len(), 13);

    let model = OrbitFitter::new(FitParams { degree: 3, centered: true })
        .fit(&samples)
        .unwrap();

    let fit_path = dir.path().join("orbit.fit");
    write_fit_file(&fit_path, &model).unwrap();

    let text = fs::read_to_string(&fit_path).unwrap();
    assert!(text.starts_with("centered: 1\n"));
    assert!(text.contains("deg: 3\n"));
    assert!(text.contains("RMS of residuals (x, y, z) [m]: ("));

    let loaded = read_fit_file(&fit_path).unwrap();
    assert_eq!(loaded, model);

    for s in &samples {
        let p = loaded.position(s.time);
        assert_abs_diff_eq!(p.x, s.position.x, epsilon = 1e-4);
        assert_abs_diff_eq!(p.y, s.position.y, epsilon = 1e-4);
        assert_abs_diff_eq!(p.z, s.position.z, epsilon = 1e-4);
    }
}

#[test]
fn test_trajectory_export() {
    let dir = TempDir::new().unwrap();
    let samples = OrbitReader::read_samples(write_orbit_file(&dir)).unwrap();
    let model = OrbitFitter::standard().fit(&samples).unwrap();

    let rows = model.sample_trajectory(4).unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].0, model.time_min());
    assert_abs_diff_eq!(rows[4].0, model.time_max(), epsilon = 1e-9);

    let out_path = dir.path().join("trajectory.txt");
    let mut out = File::create(&out_path).unwrap();
    write_positions(&mut out, &rows).unwrap();
    drop(out);

    // the export is readable as orbit samples again
    let reread = OrbitReader::read_samples(&out_path).unwrap();
    assert_eq!(reread.len(), 5);
    assert_eq!(reread[2].time, rows[2].0);
    assert_eq!(reread[2].position, rows[2].1);
}

#[test]
fn test_binary_geometry_pipeline() {
    let dir = TempDir::new().unwrap();
    let samples = OrbitReader::read_samples(write_orbit_file(&dir)).unwrap();
    let model = OrbitFitter::standard().fit(&samples).unwrap();

    let points = [[1.5_f64, 0.2, 120.0], [-1.5, -0.1, 0.0], [2.0, 0.0, 40.0]];
    let coords_path = dir.path().join("coords.bin");
    let bytes: Vec<u8> = points
        .iter()
        .flatten()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    fs::write(&coords_path, bytes).unwrap();

    let mut reader = BufReader::new(File::open(&coords_path).unwrap());
    let coords = read_coordinate_records(&mut reader).unwrap();
    assert_eq!(coords.dim(), (3, 3));

    let engine = GeometryEngine::new(&model, 1000).unwrap();
    let angles = engine.compute_array(coords.view(), CoordinateMode::Llh).unwrap();

    let out_path = dir.path().join("azi_inc.bin");
    let mut out = File::create(&out_path).unwrap();
    write_geometry_records(&mut out, &angles).unwrap();
    drop(out);

    let raw = fs::read(&out_path).unwrap();
    assert_eq!(raw.len(), 3 * 2 * 8);

    let first_azimuth = f64::from_le_bytes(raw[0..8].try_into().unwrap());
    let first_incidence = f64::from_le_bytes(raw[8..16].try_into().unwrap());
    assert_eq!(first_azimuth, angles[[0, 0]]);
    assert_eq!(first_incidence, angles[[0, 1]]);

    for row in angles.rows() {
        assert!((0.0..=360.0).contains(&row[0]));
        assert!((0.0..=90.0).contains(&row[1]));
    }
}

#[test]
fn test_missing_orbit_file() {
    let dir = TempDir::new().unwrap();
    let err = OrbitReader::read_samples(dir.path().join("absent.txt")).unwrap_err();
    assert!(matches!(err, InmetError::Io(_)));
}

use crate::types::{Cartesian, InmetError, InmetResult, OrbitSample};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Reader for ascii orbit state files (`t x y z` per line)
pub struct OrbitReader;

impl OrbitReader {
    /// Read orbit samples from a text file
    pub fn read_samples<P: AsRef<Path>>(path: P) -> InmetResult<Vec<OrbitSample>> {
        log::info!("Reading orbit samples: {}", path.as_ref().display());

        let content = fs::read_to_string(&path)?;
        let samples = parse_orbit_samples(&content)?;

        log::debug!("Read {} orbit samples", samples.len());
        Ok(samples)
    }
}

/// Parse whitespace separated `t x y z` records.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn parse_orbit_samples(content: &str) -> InmetResult<Vec<OrbitSample>> {
    let mut samples = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let values = line
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                InmetError::InvalidFormat(format!("line {}: {}", line_no + 1, e))
            })?;

        if values.len() != 4 {
            return Err(InmetError::InvalidFormat(format!(
                "line {}: expected 4 values (t x y z), found {}",
                line_no + 1,
                values.len()
            )));
        }

        samples.push(OrbitSample::new(values[0], values[1], values[2], values[3]));
    }

    Ok(samples)
}

/// Write `t x y z` rows, one epoch per line
pub fn write_positions<W: Write>(writer: &mut W, rows: &[(f64, Cartesian)]) -> InmetResult<()> {
    for (t, p) in rows {
        writeln!(writer, "{} {} {} {}", t, p.x, p.y, p.z)?;
    }
    writer.flush()?;
    Ok(())
}

use crate::types::{InmetError, InmetResult};
use ndarray::Array2;
use std::io::{Read, Write};

const F64_SIZE: usize = std::mem::size_of::<f64>();

/// Read little-endian `f64` triples (one ground point each) into an `(n, 3)` array
pub fn read_coordinate_records<R: Read>(reader: &mut R) -> InmetResult<Array2<f64>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let record = 3 * F64_SIZE;
    if bytes.len() % record != 0 {
        return Err(InmetError::InvalidFormat(format!(
            "coordinate stream of {} bytes is not a whole number of {}-byte records",
            bytes.len(),
            record
        )));
    }

    let values: Vec<f64> = bytes
        .chunks_exact(F64_SIZE)
        .map(|chunk| {
            let mut buf = [0u8; F64_SIZE];
            buf.copy_from_slice(chunk);
            f64::from_le_bytes(buf)
        })
        .collect();

    let n = values.len() / 3;
    log::debug!("Read {} ground point records", n);

    Array2::from_shape_vec((n, 3), values)
        .map_err(|e| InmetError::InvalidFormat(format!("failed to shape coordinates: {}", e)))
}

/// Write an `(n, 2)` array of `(azimuth, incidence)` as little-endian `f64` pairs
pub fn write_geometry_records<W: Write>(writer: &mut W, angles: &Array2<f64>) -> InmetResult<()> {
    if angles.ncols() != 2 {
        return Err(InmetError::InvalidFormat(format!(
            "geometry records need 2 columns, got {}",
            angles.ncols()
        )));
    }

    for value in angles.iter() {
        writer.write_all(&value.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::io::Cursor;

    fn encode(values: &[f64]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_read_records() {
        let bytes = encode(&[19.0, 47.0, 150.0, 20.5, 46.5, 90.0]);
        let coords = read_coordinate_records(&mut Cursor::new(bytes)).unwrap();

        assert_eq!(coords, array![[19.0, 47.0, 150.0], [20.5, 46.5, 90.0]]);
    }

    #[test]
    fn test_partial_record_rejected() {
        let bytes = encode(&[1.0, 2.0, 3.0, 4.0]);
        let result = read_coordinate_records(&mut Cursor::new(bytes));
        assert!(matches!(result, Err(InmetError::InvalidFormat(_))));
    }

    #[test]
    fn test_write_records_row_major() {
        let angles = array![[100.0, 35.0], [280.0, 41.5]];
        let mut out = Vec::new();
        write_geometry_records(&mut out, &angles).unwrap();

        assert_eq!(out, encode(&[100.0, 35.0, 280.0, 41.5]));
    }
}

//! Fixed 16-byte NTv2 header records
//!
//! Every header record is an 8-byte ASCII label followed by an 8-byte value:
//! a 4-byte integer plus 4 bytes of padding, an 8-character string, or a
//! double.

use serde::Serialize;
use crate::error::{Error, Result};
use crate::io::{BinaryCursor, SeekableReader, Terminator, TextEncoding};

/// Size of one header record
pub const RECORD_LEN: u64 = 16;

/// Records in the overview header and in each sub-grid header
pub const HEADER_RECORDS: i32 = 11;

/// Label of the record that closes the file
pub const END_LABEL: &str = "END";

/// Reads an 8-byte label with its padding removed
pub fn read_label<R: SeekableReader>(cursor: &mut BinaryCursor<R>) -> Result<String> {
    cursor.read_text(8, TextEncoding::Latin1, Terminator::TrimPadding)
}

fn expect_label<R: SeekableReader>(cursor: &mut BinaryCursor<R>, expected: &str) -> Result<()> {
    let offset = cursor.position();
    let label = read_label(cursor)?;
    if label != expected {
        return Err(Error::MalformedGridFile(format!(
            "expected record {} at offset {}, found {:?}",
            expected, offset, label
        )));
    }
    Ok(())
}

/// Reads an integer record
pub fn read_int<R: SeekableReader>(cursor: &mut BinaryCursor<R>, label: &str) -> Result<i32> {
    expect_label(cursor, label)?;
    let value = cursor.read_i32()?;
    cursor.skip(4)?;
    Ok(value)
}

/// Reads a string record
pub fn read_string<R: SeekableReader>(cursor: &mut BinaryCursor<R>, label: &str) -> Result<String> {
    expect_label(cursor, label)?;
    cursor.read_text(8, TextEncoding::Latin1, Terminator::TrimPadding)
}

/// Reads a double record
pub fn read_double<R: SeekableReader>(cursor: &mut BinaryCursor<R>, label: &str) -> Result<f64> {
    expect_label(cursor, label)?;
    cursor.read_f64()
}

/// Angular unit of header bounds, increments and shifts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GridUnits {
    Seconds,
    Minutes,
    Degrees,
}

impl GridUnits {
    pub fn parse(gs_type: &str) -> Result<Self> {
        match gs_type.to_ascii_uppercase().as_str() {
            "SECONDS" => Ok(GridUnits::Seconds),
            "MINUTES" => Ok(GridUnits::Minutes),
            "DEGREES" => Ok(GridUnits::Degrees),
            other => Err(Error::MalformedGridFile(format!("unknown GS_TYPE {:?}", other))),
        }
    }

    /// Factor converting this unit to arc-seconds
    pub fn to_seconds(&self) -> f64 {
        match self {
            GridUnits::Seconds => 1.0,
            GridUnits::Minutes => 60.0,
            GridUnits::Degrees => 3600.0,
        }
    }
}

/// File-level overview header
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewHeader {
    pub num_orec: i32,
    pub num_srec: i32,
    pub num_file: i32,
    pub gs_type: String,
    pub units: GridUnits,
    pub version: String,
    pub system_from: String,
    pub system_to: String,
    pub major_from: f64,
    pub minor_from: f64,
    pub major_to: f64,
    pub minor_to: f64,
}

impl OverviewHeader {
    pub fn read<R: SeekableReader>(cursor: &mut BinaryCursor<R>) -> Result<Self> {
        let num_orec = read_int(cursor, "NUM_OREC")?;
        if num_orec != HEADER_RECORDS {
            return Err(Error::MalformedGridFile(format!("NUM_OREC is {}, expected 11", num_orec)));
        }
        let num_srec = read_int(cursor, "NUM_SREC")?;
        if num_srec != HEADER_RECORDS {
            return Err(Error::MalformedGridFile(format!("NUM_SREC is {}, expected 11", num_srec)));
        }
        let num_file = read_int(cursor, "NUM_FILE")?;
        if num_file < 0 {
            return Err(Error::MalformedGridFile(format!("NUM_FILE is {}", num_file)));
        }
        let gs_type = read_string(cursor, "GS_TYPE")?;
        let units = GridUnits::parse(&gs_type)?;

        Ok(Self {
            num_orec,
            num_srec,
            num_file,
            gs_type,
            units,
            version: read_string(cursor, "VERSION")?,
            system_from: read_string(cursor, "SYSTEM_F")?,
            system_to: read_string(cursor, "SYSTEM_T")?,
            major_from: read_double(cursor, "MAJOR_F")?,
            minor_from: read_double(cursor, "MINOR_F")?,
            major_to: read_double(cursor, "MAJOR_T")?,
            minor_to: read_double(cursor, "MINOR_T")?,
        })
    }
}

/// Sub-grid header as stored, before validation
#[derive(Debug, Clone, PartialEq)]
pub struct SubGridHeader {
    pub name: String,
    pub parent: String,
    pub created: String,
    pub updated: String,
    pub south: f64,
    pub north: f64,
    pub east: f64,
    pub west: f64,
    pub lat_inc: f64,
    pub lon_inc: f64,
    pub count: i32,
}

impl SubGridHeader {
    /// Reads the remaining ten records after a SUB_NAME label was consumed
    pub fn read_after_name<R: SeekableReader>(cursor: &mut BinaryCursor<R>) -> Result<Self> {
        let name = cursor.read_text(8, TextEncoding::Latin1, Terminator::TrimPadding)?;
        Ok(Self {
            name,
            parent: read_string(cursor, "PARENT")?,
            created: read_string(cursor, "CREATED")?,
            updated: read_string(cursor, "UPDATED")?,
            south: read_double(cursor, "S_LAT")?,
            north: read_double(cursor, "N_LAT")?,
            east: read_double(cursor, "E_LONG")?,
            west: read_double(cursor, "W_LONG")?,
            lat_inc: read_double(cursor, "LAT_INC")?,
            lon_inc: read_double(cursor, "LONG_INC")?,
            count: read_int(cursor, "GS_COUNT")?,
        })
    }

    /// Row and column counts implied by the extent and spacing
    pub fn dimensions(&self) -> Result<(usize, usize)> {
        if !(self.lat_inc > 0.0) || !(self.lon_inc > 0.0) {
            return Err(Error::MalformedGridFile(format!(
                "sub-grid {} has non-positive increments ({}, {})",
                self.name, self.lat_inc, self.lon_inc
            )));
        }
        if !(self.north > self.south) || !(self.west > self.east) {
            return Err(Error::MalformedGridFile(format!(
                "sub-grid {} has an empty extent",
                self.name
            )));
        }

        let lat_steps = (self.north - self.south) / self.lat_inc;
        let lon_steps = (self.west - self.east) / self.lon_inc;
        if !is_whole(lat_steps) || !is_whole(lon_steps) {
            return Err(Error::MalformedGridFile(format!(
                "sub-grid {} extent is not a whole number of increments ({} x {})",
                self.name, lat_steps, lon_steps
            )));
        }

        let rows = lat_steps.round() + 1.0;
        let cols = lon_steps.round() + 1.0;
        if rows * cols != self.count as f64 {
            return Err(Error::MalformedGridFile(format!(
                "sub-grid {} declares {} nodes but its extent holds {} x {}",
                self.name, self.count, rows, cols
            )));
        }
        Ok((rows as usize, cols as usize))
    }
}

/// Step counts derived from header doubles carry rounding noise
const STEP_TOLERANCE: f64 = 1e-6;

fn is_whole(steps: f64) -> bool {
    steps.is_finite() && (steps - steps.round()).abs() <= STEP_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use crate::io::ByteOrder;

    fn int_record(label: &str, value: i32) -> Vec<u8> {
        let mut out = format!("{:<8}", label).into_bytes();
        out.extend(value.to_le_bytes());
        out.extend([0u8; 4]);
        out
    }

    fn cursor(data: Vec<u8>) -> BinaryCursor<Cursor<Vec<u8>>> {
        BinaryCursor::new(Cursor::new(data), ByteOrder::LittleEndian).unwrap()
    }

    #[test]
    fn test_read_int_record() {
        let mut c = cursor(int_record("NUM_OREC", 11));
        assert_eq!(read_int(&mut c, "NUM_OREC").unwrap(), 11);
        assert_eq!(c.position(), RECORD_LEN);
    }

    #[test]
    fn test_label_mismatch() {
        let mut c = cursor(int_record("NUM_SREC", 11));
        assert!(matches!(read_int(&mut c, "NUM_OREC"), Err(Error::MalformedGridFile(_))));
    }

    #[test]
    fn test_units() {
        assert_eq!(GridUnits::parse("SECONDS").unwrap().to_seconds(), 1.0);
        assert_eq!(GridUnits::parse("degrees").unwrap(), GridUnits::Degrees);
        assert!(GridUnits::parse("RADIANS").is_err());
    }

    fn header(count: i32) -> SubGridHeader {
        SubGridHeader {
            name: "ALL".into(),
            parent: "NONE".into(),
            created: String::new(),
            updated: String::new(),
            south: 0.0,
            north: 3600.0,
            east: 0.0,
            west: 7200.0,
            lat_inc: 1800.0,
            lon_inc: 1800.0,
            count,
        }
    }

    #[test]
    fn test_dimensions() {
        assert_eq!(header(15).dimensions().unwrap(), (3, 5));
        assert!(header(16).dimensions().is_err());

        let mut flat = header(15);
        flat.north = flat.south;
        assert!(flat.dimensions().is_err());

        let mut zero_inc = header(15);
        zero_inc.lon_inc = 0.0;
        assert!(zero_inc.dimensions().is_err());
    }

    #[test]
    fn test_dimensions_reject_partial_cells() {
        let mut ragged = header(15);
        ragged.north = 4000.0;
        assert!(matches!(ragged.dimensions(), Err(Error::MalformedGridFile(_))));

        let mut ragged_lon = header(15);
        ragged_lon.west = 7300.0;
        assert!(matches!(ragged_lon.dimensions(), Err(Error::MalformedGridFile(_))));

        let mut degrees = header(15);
        degrees.north = 1.0;
        degrees.west = 2.0;
        degrees.lat_inc = 0.5;
        degrees.lon_inc = 0.5;
        assert_eq!(degrees.dimensions().unwrap(), (3, 5));
    }
}

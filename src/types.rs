//! Shared value types

use serde::Serialize;

/// Sample type of a raster described by a tagged directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataType {
    U8,
    U16,
    U32,
    I8,
    I16,
    I32,
    F32,
    F64,
}

impl DataType {
    /// Maps TIFF SampleFormat (1 unsigned, 2 signed, 3 float) and BitsPerSample
    pub fn from_tiff(sample_format: u64, bits: u64) -> Option<Self> {
        match (sample_format, bits) {
            (1, 8) => Some(DataType::U8),
            (1, 16) => Some(DataType::U16),
            (1, 32) => Some(DataType::U32),
            (2, 8) => Some(DataType::I8),
            (2, 16) => Some(DataType::I16),
            (2, 32) => Some(DataType::I32),
            (3, 32) => Some(DataType::F32),
            (3, 64) => Some(DataType::F64),
            _ => None,
        }
    }

    /// Returns the size in bytes for this data type
    pub fn size(&self) -> usize {
        match self {
            DataType::U8 | DataType::I8 => 1,
            DataType::U16 | DataType::I16 => 2,
            DataType::U32 | DataType::I32 | DataType::F32 => 4,
            DataType::F64 => 8,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::U8 => "U8",
            DataType::U16 => "U16",
            DataType::U32 => "U32",
            DataType::I8 => "I8",
            DataType::I16 => "I16",
            DataType::I32 => "I32",
            DataType::F32 => "F32",
            DataType::F64 => "F64",
        }
    }
}

/// Raster dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u64,
    pub height: u64,
}

impl Dimensions {
    pub fn new(width: u64, height: u64) -> Self {
        Self { width, height }
    }

    /// Returns the total number of pixels
    pub fn pixel_count(&self) -> u64 {
        self.width.saturating_mul(self.height)
    }
}

/// Geographic extent in degrees (closed on every side)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extent {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Extent {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self { west, south, east, north }
    }

    /// Whether the point lies inside or on the boundary
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.west && lon <= self.east && lat >= self.south && lat <= self.north
    }

    /// Area in square degrees
    pub fn area(&self) -> f64 {
        (self.east - self.west) * (self.north - self.south)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_from_tiff() {
        assert_eq!(DataType::from_tiff(1, 8), Some(DataType::U8));
        assert_eq!(DataType::from_tiff(2, 16), Some(DataType::I16));
        assert_eq!(DataType::from_tiff(3, 64), Some(DataType::F64));
        assert_eq!(DataType::from_tiff(3, 16), None);
        assert_eq!(DataType::F32.size(), 4);
    }

    #[test]
    fn test_dimensions() {
        let dims = Dimensions::new(100, 200);
        assert_eq!(dims.pixel_count(), 20000);
    }

    #[test]
    fn test_extent_is_closed() {
        let extent = Extent::new(-10.0, 40.0, 5.0, 50.0);
        assert!(extent.contains(-10.0, 40.0));
        assert!(extent.contains(5.0, 50.0));
        assert!(!extent.contains(5.000001, 45.0));
        assert_eq!(extent.area(), 150.0);
    }
}

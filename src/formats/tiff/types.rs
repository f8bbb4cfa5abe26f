//! TIFF data structures

use std::fmt;
use crate::io::ByteOrder;
use super::ifd::TiffDirectory;
use super::tags;

/// Decoded TIFF or BigTIFF structure
#[derive(Debug)]
pub struct Tiff {
    pub byte_order: ByteOrder,
    pub is_big_tiff: bool,
    /// Directories in chain order
    pub directories: Vec<TiffDirectory>,
}

impl Tiff {
    pub fn new(byte_order: ByteOrder, is_big_tiff: bool) -> Self {
        Self {
            byte_order,
            is_big_tiff,
            directories: Vec::new(),
        }
    }

    /// Returns the main (first) directory
    pub fn main_directory(&self) -> Option<&TiffDirectory> {
        self.directories.first()
    }

    pub fn directory_count(&self) -> usize {
        self.directories.len()
    }
}

impl fmt::Display for Tiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TIFF File Information:")?;
        writeln!(f, "  Format: {}", if self.is_big_tiff { "BigTIFF" } else { "TIFF" })?;
        writeln!(f, "  Byte order: {}", self.byte_order.label())?;
        writeln!(f, "  Number of IFDs: {}", self.directories.len())?;

        let Some(dir) = self.main_directory() else {
            return Ok(());
        };

        writeln!(f, "\nMain Image (IFD 0):")?;
        if let Some(dims) = dir.dimensions() {
            writeln!(f, "  Dimensions: {} x {}", dims.width, dims.height)?;
        }
        writeln!(f, "  Samples per pixel: {}", dir.samples_per_pixel())?;
        if let Some(data_type) = dir.data_type() {
            writeln!(f, "  Sample type: {}", data_type.name())?;
        }
        if let Some(compression) = dir.compression() {
            writeln!(f, "  Compression: {}", compression)?;
        }
        writeln!(f, "  Tiled: {}", if dir.is_tiled() { "Yes" } else { "No" })?;
        if let Some(tile_dims) = dir.tile_dimensions() {
            writeln!(f, "  Tile size: {} x {}", tile_dims.width, tile_dims.height)?;
        }
        writeln!(f, "  GeoTIFF: {}", if dir.is_geotiff() { "Yes" } else { "No" })?;

        if dir.is_geotiff() {
            writeln!(f, "\nGeoTIFF Tags Found:")?;
            for entry in dir.geotiff_tags() {
                writeln!(
                    f,
                    "  Tag {}: {} ({} x {})",
                    entry.tag,
                    tags::tag_name(entry.tag),
                    entry.count,
                    entry.field_type.name()
                )?;
            }
        }

        if !dir.warnings().is_empty() {
            writeln!(f, "\nWarnings: {}", dir.warnings().len())?;
        }

        Ok(())
    }
}

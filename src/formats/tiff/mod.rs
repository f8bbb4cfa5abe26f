//! TIFF and BigTIFF directory decoding
//!
//! Only the tagged directory structure is decoded; pixel data is left to
//! external codecs.

pub mod tags;
pub mod ifd;
pub mod decoder;
pub mod types;
pub mod reader;
pub mod geotiff;
pub mod loader;

pub use ifd::{DirectoryEntry, DirectoryWarning, FieldType, TagValue, TiffDirectory};
pub use decoder::{decode_directory, decode_directory_with, DecodeOptions};
pub use types::Tiff;
pub use reader::TiffReader;
pub use geotiff::{GeoInfo, GeoKey, GeoKeyValue, TiePoint};
pub use loader::{GeoreferencedImage, ImageLoader, TiffMetadataLoader};

/// TIFF magic number (42)
pub const TIFF_MAGIC: u16 = 42;

/// BigTIFF magic number (43)
pub const BIGTIFF_MAGIC: u16 = 43;

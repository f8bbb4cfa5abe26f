//! skyforest-geodesy - NTv2 grid shifts, CRS resolution and TIFF directory decoding
//!
//! The crate parses NTv2 grid shift files and applies their shifts to
//! points, resolves horizontal, vertical and compound coordinate reference
//! systems from a registry, and decodes TIFF / BigTIFF tagged directories
//! (including GeoTIFF georeferencing) from binary resources.
//!
//! # Examples
//!
//! ## Shifting a point
//!
//! ```no_run
//! use skyforest_geodesy::{CoordinatesOperationPoint, GridShift};
//!
//! let grid = GridShift::open("ntv2_0.gsb", true)?;
//! let mut point = CoordinatesOperationPoint::from_lonlat(-100.0, 45.0);
//!
//! if grid.shift(&mut point) {
//!     println!("NAD83: {} {}", point.lon(), point.lat());
//! }
//! # Ok::<(), skyforest_geodesy::Error>(())
//! ```
//!
//! ## Resolving a compound CRS
//!
//! ```no_run
//! use skyforest_geodesy::CrsRegistry;
//!
//! let registry = CrsRegistry::with_builtin();
//! let compound = registry.get_compound(4269, 5703)?;
//! assert_eq!(compound.id, 5498);
//! # Ok::<(), skyforest_geodesy::Error>(())
//! ```
//!
//! ## Reading a TIFF's directories
//!
//! ```no_run
//! use skyforest_geodesy::{GeoInfo, TiffReader};
//!
//! let mut reader = TiffReader::open("image.tif")?;
//! let tiff = reader.read()?;
//!
//! if let Some(dir) = tiff.main_directory() {
//!     for entry in dir.iter() {
//!         println!("{} ({}): {} values", entry.name(), entry.tag, entry.value.len());
//!     }
//!     if let Some(geo) = GeoInfo::from_directory(dir)? {
//!         println!("{}", geo);
//!     }
//! }
//! # Ok::<(), skyforest_geodesy::Error>(())
//! ```

pub mod io;
pub mod error;
pub mod types;
pub mod config;
pub mod formats;
pub mod crs;
pub mod cache;
pub mod projection;
pub mod api;

pub use error::{Error, Result};
pub use types::{DataType, Dimensions, Extent};
pub use config::EngineConfig;
pub use cache::GridCache;
pub use crs::{
    synthesize_compound_id, CompoundCoordinateSystem, CoordinateSystem, CrsKind, CrsRegistry,
    ResolvedCrs,
};
pub use formats::ntv2::{GridShiftFile, GridShiftGrid, ShiftValue};
pub use formats::tiff::{
    decode_directory, DirectoryEntry, FieldType, GeoInfo, GeoreferencedImage, ImageLoader, TagValue,
    Tiff, TiffDirectory, TiffMetadataLoader, TiffReader, tags, BIGTIFF_MAGIC, TIFF_MAGIC,
};
pub use io::{BinaryCursor, ByteOrder, MemoryResource, Resource, SeekableReader, Terminator};
pub use projection::{
    CoordinatesOperationPoint, Datum, DatumTransform, GridShift, ShiftDirection, TransformStep,
};

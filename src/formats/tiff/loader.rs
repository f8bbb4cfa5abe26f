//! Image loading seam
//!
//! Pixel decoding lives with external codecs; this crate only needs an
//! image's size, sample type and georeferencing.

use serde::Serialize;
use tracing::debug;
use crate::error::{Error, Result};
use crate::io::{Resource, Terminator};
use crate::types::{DataType, Dimensions, Extent};
use super::geotiff::GeoInfo;
use super::ifd::TiffDirectory;
use super::reader::TiffReader;

/// Metadata of a loaded image
#[derive(Debug, Clone, Serialize)]
pub struct GeoreferencedImage {
    pub name: String,
    pub dimensions: Dimensions,
    pub data_type: Option<DataType>,
    pub geo: Option<GeoInfo>,
    /// The decoded main directory
    pub directory: TiffDirectory,
}

impl GeoreferencedImage {
    /// Model-space extent, when the image is georeferenced
    pub fn extent(&self) -> Option<Extent> {
        self.geo.as_ref()?.bounding_box(self.dimensions)
    }
}

/// Loads images from resources
pub trait ImageLoader: Send + Sync {
    fn load_image(&self, resource: &dyn Resource) -> Result<GeoreferencedImage>;

    /// Whether the loader can read images stored in zip archives
    fn supports_zip(&self) -> bool;
}

/// Reads the first directory of a TIFF and its georeferencing
#[derive(Debug, Clone, Copy, Default)]
pub struct TiffMetadataLoader {
    pub ascii_terminator: Terminator,
}

impl TiffMetadataLoader {
    pub fn new(ascii_terminator: Terminator) -> Self {
        Self { ascii_terminator }
    }
}

impl ImageLoader for TiffMetadataLoader {
    fn load_image(&self, resource: &dyn Resource) -> Result<GeoreferencedImage> {
        let directory = TiffReader::from_resource(resource, self.ascii_terminator)?.read_first()?;
        let dimensions = directory.dimensions().ok_or_else(|| {
            Error::MissingTag(if directory.contains(super::tags::IMAGE_WIDTH) {
                super::tags::IMAGE_LENGTH
            } else {
                super::tags::IMAGE_WIDTH
            })
        })?;
        let geo = GeoInfo::from_directory(&directory)?;

        debug!(
            resource = resource.name(),
            width = dimensions.width,
            height = dimensions.height,
            georeferenced = geo.is_some(),
            "loaded image metadata"
        );

        Ok(GeoreferencedImage {
            name: resource.name().to_string(),
            dimensions,
            data_type: directory.data_type(),
            geo,
            directory,
        })
    }

    fn supports_zip(&self) -> bool {
        false
    }
}

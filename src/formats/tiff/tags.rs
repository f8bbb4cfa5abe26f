//! TIFF tag and GeoKey identifiers

macro_rules! tag_table {
    ($fn_name:ident; $($(#[$doc:meta])* $name:ident = $value:literal => $label:literal,)*) => {
        $(
            $(#[$doc])*
            pub const $name: u16 = $value;
        )*

        /// Returns the registered name of an identifier, or "Unknown"
        pub fn $fn_name(id: u16) -> &'static str {
            match id {
                $($name => $label,)*
                _ => "Unknown",
            }
        }
    };
}

tag_table! { tag_name;
    /// Image width in pixels
    IMAGE_WIDTH = 256 => "ImageWidth",
    /// Image height in pixels
    IMAGE_LENGTH = 257 => "ImageLength",
    /// Bits per sample
    BITS_PER_SAMPLE = 258 => "BitsPerSample",
    /// Compression scheme
    COMPRESSION = 259 => "Compression",
    /// Photometric interpretation
    PHOTOMETRIC_INTERPRETATION = 262 => "PhotometricInterpretation",
    /// Free-form description
    IMAGE_DESCRIPTION = 270 => "ImageDescription",
    /// Strip offsets
    STRIP_OFFSETS = 273 => "StripOffsets",
    /// Samples per pixel
    SAMPLES_PER_PIXEL = 277 => "SamplesPerPixel",
    /// Rows per strip
    ROWS_PER_STRIP = 278 => "RowsPerStrip",
    /// Strip byte counts
    STRIP_BYTE_COUNTS = 279 => "StripByteCounts",
    /// X resolution
    X_RESOLUTION = 282 => "XResolution",
    /// Y resolution
    Y_RESOLUTION = 283 => "YResolution",
    /// Planar configuration
    PLANAR_CONFIGURATION = 284 => "PlanarConfiguration",
    /// Resolution unit
    RESOLUTION_UNIT = 296 => "ResolutionUnit",
    /// Producing software
    SOFTWARE = 305 => "Software",
    /// Date/time
    DATE_TIME = 306 => "DateTime",
    /// Tile width
    TILE_WIDTH = 322 => "TileWidth",
    /// Tile length
    TILE_LENGTH = 323 => "TileLength",
    /// Tile offsets
    TILE_OFFSETS = 324 => "TileOffsets",
    /// Tile byte counts
    TILE_BYTE_COUNTS = 325 => "TileByteCounts",
    /// Sample format
    SAMPLE_FORMAT = 339 => "SampleFormat",
    /// ModelPixelScaleTag
    MODEL_PIXEL_SCALE = 33550 => "ModelPixelScale",
    /// ModelTiepointTag
    MODEL_TIEPOINT = 33922 => "ModelTiepoint",
    /// ModelTransformationTag
    MODEL_TRANSFORMATION = 34264 => "ModelTransformation",
    /// GeoKeyDirectoryTag
    GEO_KEY_DIRECTORY = 34735 => "GeoKeyDirectory",
    /// GeoDoubleParamsTag
    GEO_DOUBLE_PARAMS = 34736 => "GeoDoubleParams",
    /// GeoAsciiParamsTag
    GEO_ASCII_PARAMS = 34737 => "GeoAsciiParams",
    /// GDAL metadata XML
    GDAL_METADATA = 42112 => "GDAL_METADATA",
    /// GDAL no data value
    GDAL_NODATA = 42113 => "GDAL_NODATA",
}

/// Tags that carry georeferencing
pub const GEOREFERENCING_TAGS: [u16; 6] = [
    MODEL_PIXEL_SCALE,
    MODEL_TIEPOINT,
    MODEL_TRANSFORMATION,
    GEO_KEY_DIRECTORY,
    GEO_DOUBLE_PARAMS,
    GEO_ASCII_PARAMS,
];

/// GeoKey identifiers stored inside the GeoKeyDirectory
pub mod geo_keys {
    tag_table! { geo_key_name;
        /// Model type: 1 projected, 2 geographic, 3 geocentric
        GT_MODEL_TYPE = 1024 => "GTModelTypeGeoKey",
        /// Raster type: 1 pixel-is-area, 2 pixel-is-point
        GT_RASTER_TYPE = 1025 => "GTRasterTypeGeoKey",
        /// Overall citation
        GT_CITATION = 1026 => "GTCitationGeoKey",
        /// Geographic CRS code
        GEOGRAPHIC_TYPE = 2048 => "GeographicTypeGeoKey",
        /// Geographic CRS citation
        GEOG_CITATION = 2049 => "GeogCitationGeoKey",
        /// Geodetic datum code
        GEOG_GEODETIC_DATUM = 2050 => "GeogGeodeticDatumGeoKey",
        /// Angular units code
        GEOG_ANGULAR_UNITS = 2054 => "GeogAngularUnitsGeoKey",
        /// Ellipsoid semi-major axis
        GEOG_SEMI_MAJOR_AXIS = 2057 => "GeogSemiMajorAxisGeoKey",
        /// Ellipsoid inverse flattening
        GEOG_INV_FLATTENING = 2059 => "GeogInvFlatteningGeoKey",
        /// Projected CRS code
        PROJECTED_CS_TYPE = 3072 => "ProjectedCSTypeGeoKey",
        /// Projected CRS citation
        PCS_CITATION = 3073 => "PCSCitationGeoKey",
        /// Linear units code
        PROJ_LINEAR_UNITS = 3076 => "ProjLinearUnitsGeoKey",
        /// Vertical CRS code
        VERTICAL_CS_TYPE = 4096 => "VerticalCSTypeGeoKey",
        /// Vertical CRS citation
        VERTICAL_CITATION = 4097 => "VerticalCitationGeoKey",
        /// Vertical datum code
        VERTICAL_DATUM = 4098 => "VerticalDatumGeoKey",
        /// Vertical units code
        VERTICAL_UNITS = 4099 => "VerticalUnitsGeoKey",
    }

    /// Value meaning "user-defined" in GeoKey code fields
    pub const USER_DEFINED: u16 = 32767;
}

//! GeoTIFF specific functionality

use std::fmt;
use serde::Serialize;
use tracing::{debug, warn};
use crate::crs::{CrsRegistry, ResolvedCrs};
use crate::error::{Error, Result};
use crate::projection::CoordinatesOperationPoint;
use crate::types::{Dimensions, Extent};
use super::ifd::TiffDirectory;
use super::tags::{self, geo_keys};

/// Value carried by one GeoKey
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GeoKeyValue {
    Shorts(Vec<u16>),
    Doubles(Vec<f64>),
    Ascii(String),
}

/// One entry of the GeoKeyDirectory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoKey {
    pub id: u16,
    /// Tag the value lives in; 0 when stored in the key itself
    pub location: u16,
    pub count: u16,
    pub value: GeoKeyValue,
}

impl GeoKey {
    pub fn name(&self) -> &'static str {
        geo_keys::geo_key_name(self.id)
    }

    /// The first short value, for keys stored inline
    pub fn as_short(&self) -> Option<u16> {
        match &self.value {
            GeoKeyValue::Shorts(values) => values.first().copied(),
            _ => None,
        }
    }
}

/// Represents a GeoTIFF tiepoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TiePoint {
    pub pixel_x: f64,
    pub pixel_y: f64,
    pub pixel_z: f64,
    pub geo_x: f64,
    pub geo_y: f64,
    pub geo_z: f64,
}

/// GeoTIFF information extracted from a directory
#[derive(Debug, Clone, Default, Serialize)]
pub struct GeoInfo {
    /// Model pixel scale (ScaleX, ScaleY, ScaleZ)
    pub pixel_scale: Option<(f64, f64, f64)>,
    /// Model tiepoints (pixel coord -> model coord mapping)
    pub tiepoints: Vec<TiePoint>,
    /// 4x4 row-major ModelTransformation, if present
    pub transform: Option<[f64; 16]>,
    /// Parsed GeoKeyDirectory, in directory order
    pub keys: Vec<GeoKey>,
    /// GTModelTypeGeoKey
    pub model_type: Option<u16>,
    /// ProjectedCSTypeGeoKey, else GeographicTypeGeoKey
    pub horizontal_code: Option<u32>,
    /// VerticalCSTypeGeoKey
    pub vertical_code: Option<u32>,
    /// GTCitationGeoKey, else the first citation key present
    pub citation: Option<String>,
}

impl GeoInfo {
    /// Extracts GeoTIFF information from a decoded directory
    ///
    /// Returns `Ok(None)` when the directory carries no georeferencing tags.
    pub fn from_directory(dir: &TiffDirectory) -> Result<Option<Self>> {
        if !dir.is_geotiff() {
            return Ok(None);
        }

        let mut info = GeoInfo::default();

        if let Some(values) = dir.value(tags::MODEL_PIXEL_SCALE).and_then(|v| v.as_f64s()) {
            if values.len() >= 3 {
                info.pixel_scale = Some((values[0], values[1], values[2]));
            }
        }

        if let Some(values) = dir.value(tags::MODEL_TIEPOINT).and_then(|v| v.as_f64s()) {
            info.tiepoints = values
                .chunks_exact(6)
                .map(|chunk| TiePoint {
                    pixel_x: chunk[0],
                    pixel_y: chunk[1],
                    pixel_z: chunk[2],
                    geo_x: chunk[3],
                    geo_y: chunk[4],
                    geo_z: chunk[5],
                })
                .collect();
        }

        if let Some(values) = dir.value(tags::MODEL_TRANSFORMATION).and_then(|v| v.as_f64s()) {
            if values.len() >= 16 {
                let mut matrix = [0.0; 16];
                matrix.copy_from_slice(&values[..16]);
                info.transform = Some(matrix);
            }
        }

        if let Some(directory) = dir.value(tags::GEO_KEY_DIRECTORY) {
            let shorts = directory.as_shorts().ok_or_else(|| {
                Error::InvalidFormat("GeoKeyDirectory is not SHORT-typed".to_string())
            })?;
            info.keys = parse_geo_keys(dir, shorts)?;
        }

        info.model_type = info.key_short(geo_keys::GT_MODEL_TYPE);
        info.horizontal_code = info
            .key_code(geo_keys::PROJECTED_CS_TYPE)
            .or_else(|| info.key_code(geo_keys::GEOGRAPHIC_TYPE));
        info.vertical_code = info.key_code(geo_keys::VERTICAL_CS_TYPE);
        info.citation = [
            geo_keys::GT_CITATION,
            geo_keys::PCS_CITATION,
            geo_keys::GEOG_CITATION,
        ]
        .iter()
        .find_map(|id| info.key_text(*id));

        debug!(
            keys = info.keys.len(),
            horizontal = ?info.horizontal_code,
            vertical = ?info.vertical_code,
            "parsed GeoTIFF georeferencing"
        );

        Ok(Some(info))
    }

    pub fn key(&self, id: u16) -> Option<&GeoKey> {
        self.keys.iter().find(|key| key.id == id)
    }

    fn key_short(&self, id: u16) -> Option<u16> {
        self.key(id).and_then(GeoKey::as_short)
    }

    /// A CRS code key; user-defined and zero mean "no code"
    fn key_code(&self, id: u16) -> Option<u32> {
        self.key_short(id)
            .filter(|code| *code != 0 && *code != geo_keys::USER_DEFINED)
            .map(u32::from)
    }

    fn key_text(&self, id: u16) -> Option<String> {
        match &self.key(id)?.value {
            GeoKeyValue::Ascii(text) if !text.is_empty() => Some(text.clone()),
            _ => None,
        }
    }

    /// Computes the affine transform from pixel to model coordinates
    ///
    /// Returns [a, b, c, d, e, f] where:
    /// geo_x = a + b * pixel_x + c * pixel_y
    /// geo_y = d + e * pixel_x + f * pixel_y
    pub fn affine_transform(&self) -> Option<[f64; 6]> {
        if let Some(m) = &self.transform {
            return Some([m[3], m[0], m[1], m[7], m[4], m[5]]);
        }

        let (scale_x, scale_y, _) = self.pixel_scale?;
        let tp = self.tiepoints.first()?;
        Some([
            tp.geo_x - scale_x * tp.pixel_x,
            scale_x,
            0.0,
            tp.geo_y + scale_y * tp.pixel_y,
            0.0,
            -scale_y,
        ])
    }

    /// Computes the model-space extent of an image of the given size
    pub fn bounding_box(&self, dims: Dimensions) -> Option<Extent> {
        let corners = [
            (0.0, 0.0),
            (dims.width as f64, 0.0),
            (0.0, dims.height as f64),
            (dims.width as f64, dims.height as f64),
        ];

        let t = self.affine_transform()?;
        let mut extent = Extent::new(f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (px, py) in corners {
            let x = t[0] + t[1] * px + t[2] * py;
            let y = t[3] + t[4] * px + t[5] * py;
            extent.west = extent.west.min(x);
            extent.east = extent.east.max(x);
            extent.south = extent.south.min(y);
            extent.north = extent.north.max(y);
        }
        Some(extent)
    }

    /// Converts pixel coordinates to model coordinates
    pub fn pixel_to_geo(&self, pixel_x: f64, pixel_y: f64) -> Option<CoordinatesOperationPoint> {
        let t = self.affine_transform()?;

        let geo_x = t[0] + t[1] * pixel_x + t[2] * pixel_y;
        let geo_y = t[3] + t[4] * pixel_x + t[5] * pixel_y;

        Some(CoordinatesOperationPoint::new(geo_x, geo_y))
    }

    /// Converts model coordinates to (fractional) pixel coordinates
    pub fn geo_to_pixel(&self, point: &CoordinatesOperationPoint) -> Option<(f64, f64)> {
        let t = self.affine_transform()?;

        let det = t[1] * t[5] - t[2] * t[4];
        if det.abs() < 1e-10 {
            return None;
        }

        let dx = point.x - t[0];
        let dy = point.y - t[3];

        let pixel_x = (t[5] * dx - t[2] * dy) / det;
        let pixel_y = (-t[4] * dx + t[1] * dy) / det;

        Some((pixel_x, pixel_y))
    }

    /// Resolves the image CRS: a single system, or a compound when a
    /// vertical code is present
    pub fn resolve_crs(&self, registry: &CrsRegistry) -> Result<ResolvedCrs> {
        let horizontal = self
            .horizontal_code
            .ok_or(Error::MissingTag(geo_keys::GEOGRAPHIC_TYPE))?;

        match self.vertical_code {
            Some(vertical) => Ok(ResolvedCrs::Compound(registry.get_compound(horizontal, vertical)?)),
            None => Ok(ResolvedCrs::Single(registry.get(horizontal)?.clone())),
        }
    }
}

/// Decodes the key table; `shorts` is the GeoKeyDirectory value
fn parse_geo_keys(dir: &TiffDirectory, shorts: &[u16]) -> Result<Vec<GeoKey>> {
    if shorts.len() < 4 {
        return Err(Error::InvalidFormat(format!(
            "GeoKeyDirectory too short: {} values",
            shorts.len()
        )));
    }

    let declared = shorts[3] as usize;
    let available = (shorts.len() - 4) / 4;
    if declared > available {
        warn!(declared, available, "GeoKeyDirectory declares more keys than it holds");
    }

    let doubles = dir.value(tags::GEO_DOUBLE_PARAMS).and_then(|v| v.as_f64s());
    let ascii = dir.value(tags::GEO_ASCII_PARAMS).and_then(|v| v.as_str());

    let mut keys = Vec::with_capacity(declared.min(available));
    for raw in shorts[4..].chunks_exact(4).take(declared) {
        let (id, location, count, value_offset) = (raw[0], raw[1], raw[2], raw[3]);
        let start = value_offset as usize;
        let end = start + count as usize;

        let value = match location {
            0 => Some(GeoKeyValue::Shorts(vec![value_offset])),
            tags::GEO_KEY_DIRECTORY => shorts.get(start..end).map(|s| GeoKeyValue::Shorts(s.to_vec())),
            tags::GEO_DOUBLE_PARAMS => doubles
                .as_ref()
                .and_then(|d| d.get(start..end))
                .map(|d| GeoKeyValue::Doubles(d.to_vec())),
            tags::GEO_ASCII_PARAMS => ascii.and_then(|text| {
                let chars: Vec<char> = text.chars().collect();
                chars.get(start..end).map(|slice| {
                    let text: String = slice.iter().collect();
                    GeoKeyValue::Ascii(text.trim_end_matches(&['|', '\0'][..]).to_string())
                })
            }),
            _ => None,
        };

        match value {
            Some(value) => keys.push(GeoKey { id, location, count, value }),
            None => warn!(
                key = geo_keys::geo_key_name(id),
                location,
                value_offset,
                count,
                "GeoKey value out of range, skipped"
            ),
        }
    }

    Ok(keys)
}

impl fmt::Display for GeoInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nGeoTIFF Information:")?;

        if let Some(code) = self.horizontal_code {
            writeln!(f, "  Horizontal CRS: EPSG:{}", code)?;
        }
        if let Some(code) = self.vertical_code {
            writeln!(f, "  Vertical CRS: EPSG:{}", code)?;
        }
        if let Some(ref citation) = self.citation {
            writeln!(f, "  Citation: {}", citation)?;
        }
        if let Some((sx, sy, _sz)) = self.pixel_scale {
            writeln!(f, "  Pixel Size: {} x {}", sx, sy)?;
        }
        if let Some(tp) = self.tiepoints.first() {
            writeln!(f, "  Origin (geo): ({}, {})", tp.geo_x, tp.geo_y)?;
        }
        if !self.keys.is_empty() {
            writeln!(f, "  GeoKeys:")?;
            for key in &self.keys {
                match &key.value {
                    GeoKeyValue::Shorts(values) if values.len() == 1 => {
                        writeln!(f, "    {} = {}", key.name(), values[0])?
                    }
                    GeoKeyValue::Shorts(values) => writeln!(f, "    {} = {:?}", key.name(), values)?,
                    GeoKeyValue::Doubles(values) => writeln!(f, "    {} = {:?}", key.name(), values)?,
                    GeoKeyValue::Ascii(text) => writeln!(f, "    {} = \"{}\"", key.name(), text)?,
                }
            }
        }

        Ok(())
    }
}

use serde::{Deserialize, Serialize};
use crate::crs::ResolvedCrs;
use crate::formats::tiff::{GeoInfo, TiffDirectory};
use crate::types::{DataType, Dimensions, Extent};

#[derive(Debug, Serialize, Deserialize)]
pub struct CompoundRequest {
    pub horizontal: u32,
    pub vertical: u32,
}

#[derive(Debug, Serialize)]
pub struct CrsResponse {
    pub crs: ResolvedCrs,
    pub execution_time_ms: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShiftRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub inverse: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShiftResponse {
    pub latitude: f64,
    pub longitude: f64,
    /// False when no sub-grid covers the point; coordinates are then unchanged
    pub shifted: bool,
    /// Shift at the source-datum position of the point, so that
    /// target = source + shift for both directions
    pub latitude_shift_arcsec: Option<f64>,
    pub longitude_shift_arcsec: Option<f64>,
    pub execution_time_ms: f64,
}

#[derive(Debug, Deserialize)]
pub struct CsvPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CsvResult {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    pub shifted_latitude: f64,
    pub shifted_longitude: f64,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DirectoryResponse {
    pub name: String,
    pub byte_order: &'static str,
    pub big_tiff: bool,
    pub dimensions: Option<Dimensions>,
    pub data_type: Option<DataType>,
    pub directories: Vec<TiffDirectory>,
    pub geo: Option<GeoInfo>,
    pub extent: Option<Extent>,
    pub crs: Option<ResolvedCrs>,
    pub execution_time_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    body::Body,
    Json,
};
use axum::extract::multipart::Multipart;
use std::time::Instant;
use std::io::Cursor;
use tracing::{debug, warn};

use crate::error::Error;
use crate::formats::tiff::{ImageLoader, TiffReader};
use crate::io::MemoryResource;
use crate::projection::{CoordinatesOperationPoint, GridShift};
use super::models::*;
use super::AppState;

/// Error returned by handlers, rendered as `{"error": ...}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::UnknownCoordinateSystem(_) => StatusCode::NOT_FOUND,
            Error::Io(_) | Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

pub async fn get_crs(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> ApiResult<Json<CrsResponse>> {
    let start = Instant::now();
    let crs = state.registry.resolve(id)?;

    Ok(Json(CrsResponse {
        crs,
        execution_time_ms: elapsed_ms(start),
    }))
}

pub async fn get_compound(
    State(state): State<AppState>,
    Query(req): Query<CompoundRequest>,
) -> ApiResult<Json<CrsResponse>> {
    let start = Instant::now();
    let compound = state.registry.get_compound(req.horizontal, req.vertical)?;

    Ok(Json(CrsResponse {
        crs: crate::crs::ResolvedCrs::Compound(compound),
        execution_time_ms: elapsed_ms(start),
    }))
}

fn configured_grids(state: &AppState) -> ApiResult<&GridShift> {
    state
        .grids
        .as_deref()
        .ok_or_else(|| ApiError::from(Error::Config("no grid shift files configured".to_string())))
}

pub async fn get_shift(
    State(state): State<AppState>,
    Query(req): Query<ShiftRequest>,
) -> ApiResult<Json<ShiftResponse>> {
    let start = Instant::now();
    let grid = configured_grids(&state)?;

    let mut point = CoordinatesOperationPoint::from_lonlat(req.longitude, req.latitude);
    // Reported shift is the one between the two datums: taken at the input
    // for a forward shift, at the result for an inverse shift
    let (shifted, value) = if req.inverse {
        let shifted = grid.shift_inverse(&mut point);
        (shifted, if shifted { grid.shift_value(&point) } else { None })
    } else {
        let value = grid.shift_value(&point);
        (grid.shift(&mut point), value)
    };

    Ok(Json(ShiftResponse {
        latitude: point.lat(),
        longitude: point.lon(),
        shifted,
        latitude_shift_arcsec: value.map(|v| v.lat_shift),
        longitude_shift_arcsec: value.map(|v| v.lon_shift),
        execution_time_ms: elapsed_ms(start),
    }))
}

/// Collects the named file field and the optional `inverse` flag
async fn read_upload(multipart: &mut Multipart, file_field: &str) -> ApiResult<(Vec<u8>, Option<String>, bool)> {
    let mut data = None;
    let mut file_name = None;
    let mut inverse = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            n if n == file_field => {
                file_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read {}: {}", file_field, e)))?;
                data = Some(bytes.to_vec());
            }
            "inverse" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read inverse: {}", e)))?;
                inverse = matches!(text.trim(), "1" | "true" | "yes");
            }
            _ => {}
        }
    }

    let data = data.ok_or_else(|| ApiError::bad_request(format!("Missing {} file", file_field)))?;
    Ok((data, file_name, inverse))
}

pub async fn shift_batch(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let start = Instant::now();
    let grid = configured_grids(&state)?.clone();
    let (csv_data, _, inverse) = read_upload(&mut multipart, "csv").await?;

    let grid = if inverse { grid.reversed() } else { grid };
    let body = process_csv_batch(&csv_data, &grid, start)?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime::TEXT_CSV.as_ref())
        .header(header::CONTENT_DISPOSITION, "attachment; filename=\"shifted_points.csv\"")
        .body(Body::from(body))
        .map_err(|e| ApiError::from(Error::InvalidFormat(e.to_string())))
}

pub async fn describe_directory(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<DirectoryResponse>> {
    let start = Instant::now();
    let (data, file_name, _) = read_upload(&mut multipart, "tiff").await?;
    let name = file_name.unwrap_or_else(|| "upload.tif".to_string());
    let resource = MemoryResource::new(name.clone(), data);

    let tiff = TiffReader::from_resource(&resource, state.loader.ascii_terminator)?.read()?;
    let image = state.loader.load_image(&resource)?;
    let extent = image.extent();
    let geo = image.geo;
    let crs = match &geo {
        Some(info) if info.horizontal_code.is_some() => match info.resolve_crs(&state.registry) {
            Ok(crs) => Some(crs),
            Err(e) => {
                warn!(file = %name, error = %e, "could not resolve image CRS");
                None
            }
        },
        _ => None,
    };

    debug!(file = %name, directories = tiff.directory_count(), "described TIFF upload");

    Ok(Json(DirectoryResponse {
        name,
        byte_order: tiff.byte_order.label(),
        big_tiff: tiff.is_big_tiff,
        dimensions: Some(image.dimensions),
        data_type: image.data_type,
        extent,
        geo,
        crs,
        directories: tiff.directories,
        execution_time_ms: elapsed_ms(start),
    }))
}

/// Shifts every CSV row and renders the result as CSV with a statistics preamble
pub fn process_csv_batch(csv_data: &[u8], grid: &GridShift, start: Instant) -> crate::Result<String> {
    let mut csv_reader = csv::Reader::from_reader(Cursor::new(csv_data));
    let mut points: Vec<CsvPoint> = Vec::new();

    for (line, result) in csv_reader.deserialize().enumerate() {
        let point: CsvPoint = result
            .map_err(|e| Error::InvalidFormat(format!("CSV row {}: {}", line + 1, e)))?;
        points.push(point);
    }

    let mut shifted: Vec<CoordinatesOperationPoint> = points
        .iter()
        .map(|p| CoordinatesOperationPoint::from_lonlat(p.longitude, p.latitude))
        .collect();
    let covered = grid.shift_each(&mut shifted);
    let successful = covered.iter().filter(|c| **c).count();

    let mut writer = csv::Writer::from_writer(Vec::with_capacity(points.len() * 64));
    for ((point, result), covered) in points.iter().zip(&shifted).zip(&covered) {
        writer
            .serialize(CsvResult {
                latitude: point.latitude,
                longitude: point.longitude,
                name: point.name.clone().unwrap_or_default(),
                shifted_latitude: result.lat(),
                shifted_longitude: result.lon(),
                status: if *covered { "SHIFTED" } else { "OUTSIDE_GRID" },
            })
            .map_err(|e| Error::InvalidFormat(e.to_string()))?;
    }
    let rows = writer
        .into_inner()
        .map_err(|e| Error::InvalidFormat(e.to_string()))?;

    let mut csv_output = String::with_capacity(rows.len() + 160);
    csv_output.push_str("# Statistics\n");
    csv_output.push_str(&format!("# Total points: {}\n", points.len()));
    csv_output.push_str(&format!("# Shifted: {}\n", successful));
    csv_output.push_str(&format!("# Outside grid: {}\n", points.len() - successful));
    csv_output.push_str(&format!("# Execution time: {:.2} ms\n", elapsed_ms(start)));
    csv_output.push_str(&String::from_utf8_lossy(&rows));

    Ok(csv_output)
}

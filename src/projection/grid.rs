use std::path::Path;
use std::sync::Arc;
use rayon::prelude::*;
use tracing::debug;
use crate::error::Result;
use crate::formats::ntv2::{GridShiftFile, ShiftValue};
use crate::projection::coordinate::{to_arcsec_pw, CoordinatesOperationPoint};
use crate::projection::datum::TransformStep;

/// Convergence tolerance of the inverse shift, in degrees
pub const INVERSE_TOLERANCE: f64 = 1e-12;

/// Iteration cap of the inverse shift
pub const INVERSE_MAX_ITERATIONS: usize = 10;

/// Direction a [`GridShift`] applies its grids in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    Forward,
    Inverse,
}

/// Applies NTv2 grid shifts to points in degrees
///
/// Holds one or more parsed files; the first file with a sub-grid covering
/// the point is used. Files are shared read-only, so a `GridShift` can be
/// cloned and used from many threads.
#[derive(Debug, Clone)]
pub struct GridShift {
    files: Vec<Arc<GridShiftFile>>,
    direction: ShiftDirection,
}

impl GridShift {
    /// Creates a forward grid shift over one file
    pub fn new(file: Arc<GridShiftFile>) -> Self {
        Self::from_files(vec![file])
    }

    /// Creates a forward grid shift over several files, searched in order
    pub fn from_files(files: Vec<Arc<GridShiftFile>>) -> Self {
        Self {
            files,
            direction: ShiftDirection::Forward,
        }
    }

    /// Opens and parses a single grid file
    pub fn open<P: AsRef<Path>>(path: P, use_mmap: bool) -> Result<Self> {
        Ok(Self::new(Arc::new(GridShiftFile::open(path, use_mmap)?)))
    }

    /// The same grids applied in the opposite direction
    pub fn reversed(&self) -> Self {
        let direction = match self.direction {
            ShiftDirection::Forward => ShiftDirection::Inverse,
            ShiftDirection::Inverse => ShiftDirection::Forward,
        };
        Self {
            files: self.files.clone(),
            direction,
        }
    }

    pub fn direction(&self) -> ShiftDirection {
        self.direction
    }

    pub fn files(&self) -> &[Arc<GridShiftFile>] {
        &self.files
    }

    /// Interpolated shift in arc-seconds at a point in degrees
    pub fn shift_value(&self, point: &CoordinatesOperationPoint) -> Option<ShiftValue> {
        let (lon_pw, lat) = to_arcsec_pw(point);
        self.files.iter().find_map(|file| file.interpolate(lon_pw, lat))
    }

    /// Applies the forward shift in place
    ///
    /// Returns false and leaves the point untouched when no sub-grid covers it.
    pub fn shift(&self, point: &mut CoordinatesOperationPoint) -> bool {
        let (lon_pw, lat) = to_arcsec_pw(point);
        let Some(value) = self.files.iter().find_map(|file| file.interpolate(lon_pw, lat)) else {
            return false;
        };

        point.x = -(lon_pw + value.lon_shift) / 3600.0;
        point.y = (lat + value.lat_shift) / 3600.0;
        true
    }

    /// Applies the inverse shift in place
    ///
    /// Finds the point whose forward shift lands on `point` by fixed-point
    /// iteration. Returns false and leaves the point untouched when no
    /// sub-grid covers it.
    pub fn shift_inverse(&self, point: &mut CoordinatesOperationPoint) -> bool {
        let target = *point;
        let mut estimate = target;

        for iteration in 0..INVERSE_MAX_ITERATIONS {
            let mut forward = estimate;
            if !self.shift(&mut forward) {
                if iteration == 0 {
                    return false;
                }
                debug!(iteration, "inverse shift left grid coverage, keeping last estimate");
                break;
            }

            let dx = forward.x - target.x;
            let dy = forward.y - target.y;
            estimate.x -= dx;
            estimate.y -= dy;

            if dx.abs() < INVERSE_TOLERANCE && dy.abs() < INVERSE_TOLERANCE {
                break;
            }
        }

        *point = estimate;
        true
    }

    /// Applies the shift in this grid's direction
    pub fn apply_shift(&self, point: &mut CoordinatesOperationPoint) -> bool {
        match self.direction {
            ShiftDirection::Forward => self.shift(point),
            ShiftDirection::Inverse => self.shift_inverse(point),
        }
    }

    /// Shifts many points in parallel; returns how many were covered
    pub fn shift_many(&self, points: &mut [CoordinatesOperationPoint]) -> usize {
        points
            .par_iter_mut()
            .map(|point| usize::from(self.apply_shift(point)))
            .sum()
    }

    /// Shifts many points in parallel, reporting coverage per point
    pub fn shift_each(&self, points: &mut [CoordinatesOperationPoint]) -> Vec<bool> {
        points.par_iter_mut().map(|point| self.apply_shift(point)).collect()
    }
}

impl TransformStep for GridShift {
    fn apply(&self, point: &mut CoordinatesOperationPoint) -> Result<bool> {
        Ok(self.apply_shift(point))
    }

    fn name(&self) -> String {
        let names: Vec<&str> = self.files.iter().map(|f| f.name.as_str()).collect();
        match self.direction {
            ShiftDirection::Forward => format!("grid shift {}", names.join(",")),
            ShiftDirection::Inverse => format!("inverse grid shift {}", names.join(",")),
        }
    }
}

use std::fmt;
use std::sync::Arc;
use serde::Serialize;
use tracing::debug;
use crate::error::{Error, Result};
use crate::formats::ntv2::GridShiftFile;
use crate::projection::coordinate::CoordinatesOperationPoint;
use crate::projection::grid::GridShift;

/// One step of a coordinate operation, applied in place
///
/// `Ok(false)` means the step did not apply to this point (outside grid
/// coverage, nothing to do) and the point is unchanged.
pub trait TransformStep: Send + Sync {
    fn apply(&self, point: &mut CoordinatesOperationPoint) -> Result<bool>;

    /// Short description used in diagnostics
    fn name(&self) -> String;
}

/// Represents common geodetic datums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Datum {
    WGS84,
    NAD83,
    NAD27,
    ETRS89,
    GDA94,
    GDA2020,
    OSGB36,
    Custom,
}

impl Datum {
    /// Parses a datum name as written in grid file headers
    pub fn from_name(name: &str) -> Self {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase();
        match normalized.as_str() {
            "WGS84" => Datum::WGS84,
            "NAD83" => Datum::NAD83,
            "NAD27" => Datum::NAD27,
            "ETRS89" => Datum::ETRS89,
            "GDA94" => Datum::GDA94,
            "GDA2020" => Datum::GDA2020,
            "OSGB36" => Datum::OSGB36,
            _ => Datum::Custom,
        }
    }

    /// Datum of a built-in geographic CRS id
    pub fn for_crs(id: u32) -> Option<Self> {
        match id {
            4326 | 4979 | 4978 => Some(Datum::WGS84),
            4269 => Some(Datum::NAD83),
            4267 => Some(Datum::NAD27),
            4258 => Some(Datum::ETRS89),
            4283 => Some(Datum::GDA94),
            7844 => Some(Datum::GDA2020),
            4277 => Some(Datum::OSGB36),
            _ => None,
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Transforms points between two geodetic datums through ordered steps
pub struct DatumTransform {
    from_datum: Datum,
    to_datum: Datum,
    steps: Vec<Box<dyn TransformStep>>,
}

impl DatumTransform {
    /// Creates a transform with no steps yet
    pub fn new(from_datum: Datum, to_datum: Datum) -> Self {
        Self {
            from_datum,
            to_datum,
            steps: Vec::new(),
        }
    }

    /// Appends a step
    pub fn with_step(mut self, step: impl TransformStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Builds the transform described by a grid file's SYSTEM_F / SYSTEM_T
    pub fn from_grid(file: Arc<GridShiftFile>) -> Self {
        let from_datum = Datum::from_name(&file.header.system_from);
        let to_datum = Datum::from_name(&file.header.system_to);
        Self::new(from_datum, to_datum).with_step(GridShift::new(file))
    }

    /// Builds the reverse of [`DatumTransform::from_grid`]
    pub fn from_grid_inverse(file: Arc<GridShiftFile>) -> Self {
        let from_datum = Datum::from_name(&file.header.system_to);
        let to_datum = Datum::from_name(&file.header.system_from);
        Self::new(from_datum, to_datum).with_step(GridShift::new(file).reversed())
    }

    /// Returns the source datum
    pub fn from_datum(&self) -> Datum {
        self.from_datum
    }

    /// Returns the target datum
    pub fn to_datum(&self) -> Datum {
        self.to_datum
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Runs every step in order
    ///
    /// Identical datums need no shift: `Ok(false)` with the point untouched.
    /// Returns true when at least one step applied.
    pub fn transform(&self, point: &mut CoordinatesOperationPoint) -> Result<bool> {
        if self.from_datum == self.to_datum && self.from_datum != Datum::Custom {
            return Ok(false);
        }
        if self.steps.is_empty() {
            return Err(Error::Unsupported(format!(
                "no transform steps from {} to {}",
                self.from_datum, self.to_datum
            )));
        }

        let mut applied = false;
        for step in &self.steps {
            let step_applied = step.apply(point)?;
            debug!(step = %step.name(), applied = step_applied, "datum step");
            applied |= step_applied;
        }
        Ok(applied)
    }
}

impl TransformStep for DatumTransform {
    fn apply(&self, point: &mut CoordinatesOperationPoint) -> Result<bool> {
        self.transform(point)
    }

    fn name(&self) -> String {
        format!("{} -> {}", self.from_datum, self.to_datum)
    }
}

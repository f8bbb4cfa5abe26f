//! Coordinate operations: in-place points, grid shifts and datum pipelines

pub mod coordinate;
pub mod datum;
pub mod grid;

pub use coordinate::CoordinatesOperationPoint;
pub use datum::{Datum, DatumTransform, TransformStep};
pub use grid::{GridShift, ShiftDirection};

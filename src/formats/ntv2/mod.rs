//! NTv2 grid shift files (`.gsb`)

pub mod records;
pub mod grid;
pub mod file;

#[cfg(test)]
pub(crate) mod test_support;

pub use file::GridShiftFile;
pub use grid::{GridShiftGrid, ShiftValue};
pub use records::{GridUnits, OverviewHeader};

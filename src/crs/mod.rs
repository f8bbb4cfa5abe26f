//! Coordinate reference system registry
//!
//! Systems are keyed by their EPSG-style numeric id. Horizontal and vertical
//! systems compose into compound systems whose id is either a registered
//! code or one synthesized deterministically from the component ids.

pub mod catalog;
pub mod registry;
pub mod system;

pub use registry::{synthesize_compound_id, CrsRegistry};
pub use system::{CompoundCoordinateSystem, CoordinateSystem, CrsKind, ResolvedCrs};

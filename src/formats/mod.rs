//! Binary formats read by the engine

pub mod tiff;
pub mod ntv2;

//! Error types for skyforest-geodesy

use std::io;
use thiserror::Error;

/// Result type for skyforest-geodesy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while reading grids, directories or resolving CRSs
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A read ran past the end of the underlying source
    #[error("Unexpected end of data: needed {needed} bytes at offset {offset}, {available} available")]
    UnexpectedEndOfData {
        offset: u64,
        needed: u64,
        available: u64,
    },

    /// Grid shift file failed structural validation
    #[error("Malformed grid file: {0}")]
    MalformedGridFile(String),

    /// Requested id has no registry entry
    #[error("Unknown coordinate system: {0}")]
    UnknownCoordinateSystem(u32),

    /// Invalid binary format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Invalid byte order marker
    #[error("Invalid byte order: 0x{0:04X}")]
    InvalidByteOrder(u16),

    /// Invalid TIFF magic number
    #[error("Invalid TIFF magic number: {0}")]
    InvalidMagic(u16),

    /// Invalid directory or value offset
    #[error("Invalid offset: {0}")]
    InvalidOffset(u64),

    /// Missing required tag
    #[error("Missing required tag: {0}")]
    MissingTag(u16),

    /// Unsupported feature
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns whether this error came from a truncated source
    pub fn is_end_of_data(&self) -> bool {
        match self {
            Error::UnexpectedEndOfData { .. } => true,
            Error::Io(e) => e.kind() == io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}

//! TIFF / BigTIFF header validation and directory chain walking

use std::collections::HashSet;
use std::path::Path;
use tracing::debug;
use crate::error::{Error, Result};
use crate::io::{open_resource, ByteOrder, Resource, ResourceCursor, Terminator};
use super::decoder::{decode_directory_with, DecodeOptions};
use super::ifd::TiffDirectory;
use super::types::Tiff;
use super::{BIGTIFF_MAGIC, TIFF_MAGIC};

/// Upper bound on directories followed in one chain
pub const MAX_DIRECTORIES: usize = 1000;

/// Reads the directory chain of a TIFF or BigTIFF resource
pub struct TiffReader {
    cursor: ResourceCursor,
    options: DecodeOptions,
    first_offset: u64,
}

impl TiffReader {
    /// Opens a TIFF file with default options (memory-mapped)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, true, Terminator::default())
    }

    /// Opens a TIFF file
    ///
    /// # Arguments
    /// * `path` - Path to the TIFF file (`.gz` is inflated in memory)
    /// * `use_mmap` - Whether to memory-map the file
    /// * `ascii_terminator` - Terminator policy for ASCII values
    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        use_mmap: bool,
        ascii_terminator: Terminator,
    ) -> Result<Self> {
        let resource = open_resource(path, use_mmap);
        Self::from_resource(resource.as_ref(), ascii_terminator)
    }

    /// Validates the header of a resource and prepares to read its chain
    pub fn from_resource(resource: &dyn Resource, ascii_terminator: Terminator) -> Result<Self> {
        let mut cursor = resource.cursor(ByteOrder::LittleEndian)?;

        let marker = cursor.read_array::<2>()?;
        let byte_order = ByteOrder::from_tiff_magic(marker)
            .ok_or_else(|| Error::InvalidByteOrder(u16::from_be_bytes(marker)))?;
        cursor.set_byte_order(byte_order);

        let magic = cursor.read_u16()?;
        let big_tiff = match magic {
            TIFF_MAGIC => false,
            BIGTIFF_MAGIC => true,
            _ => return Err(Error::InvalidMagic(magic)),
        };

        let first_offset = if big_tiff {
            let offset_size = cursor.read_u16()?;
            if offset_size != 8 {
                return Err(Error::InvalidFormat(format!(
                    "Invalid BigTIFF offset size: {}",
                    offset_size
                )));
            }
            let _reserved = cursor.read_u16()?;
            cursor.read_u64()?
        } else {
            cursor.read_u32()? as u64
        };

        debug!(
            resource = resource.name(),
            byte_order = byte_order.label(),
            big_tiff,
            first_offset,
            "read TIFF header"
        );

        Ok(Self {
            cursor,
            options: DecodeOptions { big_tiff, ascii_terminator },
            first_offset,
        })
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.cursor.byte_order()
    }

    pub fn is_big_tiff(&self) -> bool {
        self.options.big_tiff
    }

    /// Decodes the directory at `offset`
    pub fn read_directory(&mut self, number: usize, offset: u64) -> Result<TiffDirectory> {
        self.cursor.seek(offset)?;
        decode_directory_with(&mut self.cursor, number, &self.options)
    }

    /// Decodes only the first directory
    pub fn read_first(&mut self) -> Result<TiffDirectory> {
        if self.first_offset == 0 {
            return Err(Error::InvalidFormat("TIFF has no directories".to_string()));
        }
        self.read_directory(0, self.first_offset)
    }

    /// Follows the whole directory chain
    pub fn read(&mut self) -> Result<Tiff> {
        let mut tiff = Tiff::new(self.byte_order(), self.is_big_tiff());
        let mut visited = HashSet::new();
        let mut next = self.first_offset;

        while next != 0 {
            if tiff.directories.len() >= MAX_DIRECTORIES {
                return Err(Error::InvalidFormat("Too many IFDs".to_string()));
            }
            if !visited.insert(next) {
                return Err(Error::InvalidFormat(format!(
                    "IFD chain loops back to offset {}",
                    next
                )));
            }

            let directory = self.read_directory(tiff.directories.len(), next)?;
            next = directory.next_offset;
            tiff.directories.push(directory);
        }

        Ok(tiff)
    }
}

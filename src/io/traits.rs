//! Core I/O traits

use std::io::{Read, Result, Seek, SeekFrom};

/// Trait for readers that support both reading and seeking operations
///
/// Automatically implemented for any [`Read`] + [`Seek`] type that is also
/// [`Send`] and [`Sync`], so parsed resources can move between threads.
pub trait SeekableReader: Read + Seek + Send + Sync {}

impl<T: Read + Seek + Send + Sync> SeekableReader for T {}

/// Returns the total length of a seekable source, keeping its position
pub fn source_len<R: Seek + ?Sized>(reader: &mut R) -> Result<u64> {
    let current = reader.stream_position()?;
    let len = reader.seek(SeekFrom::End(0))?;
    if current != len {
        reader.seek(SeekFrom::Start(current))?;
    }
    Ok(len)
}

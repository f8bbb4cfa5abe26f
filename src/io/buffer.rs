//! Buffered reading for streamed (non-mapped) resources
//!
//! Grid files are read as long runs of 16-byte records, so most reads are
//! served from the buffer. Relative seeks that stay inside the buffered
//! window do not touch the underlying reader.

use std::io::{Read, Result, Seek, SeekFrom};
use crate::io::SeekableReader;

/// A buffered reader that wraps any [`SeekableReader`]
pub struct BufferedReader<R: SeekableReader> {
    inner: R,
    buffer: Vec<u8>,
    pos: usize,
    cap: usize,
    /// Absolute offset of `buffer[0]` in the underlying source
    window_start: u64,
}

impl<R: SeekableReader> BufferedReader<R> {
    /// Creates a new buffered reader with default buffer size (8KB)
    pub fn new(inner: R) -> Self {
        Self::with_capacity(8192, inner)
    }

    /// Creates a new buffered reader with specified buffer size
    pub fn with_capacity(capacity: usize, mut inner: R) -> Self {
        let window_start = inner.stream_position().unwrap_or(0);
        Self {
            inner,
            buffer: vec![0; capacity.max(1)],
            pos: 0,
            cap: 0,
            window_start,
        }
    }

    /// Returns a reference to the underlying reader
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Consumes the buffered reader and returns the underlying reader
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Returns the number of bytes currently buffered
    pub fn buffer_len(&self) -> usize {
        self.cap - self.pos
    }

    /// Logical position in the underlying source
    pub fn position(&self) -> u64 {
        self.window_start + self.pos as u64
    }

    fn fill_buffer(&mut self) -> Result<()> {
        self.window_start += self.cap as u64;
        self.cap = self.inner.read(&mut self.buffer)?;
        self.pos = 0;
        Ok(())
    }

    fn discard_buffer(&mut self, new_position: u64) {
        self.window_start = new_position;
        self.pos = 0;
        self.cap = 0;
    }

    /// Reads exactly `size` bytes
    pub fn read_chunk(&mut self, size: usize) -> Result<Vec<u8>> {
        let mut chunk = vec![0u8; size];
        self.read_exact(&mut chunk)?;
        Ok(chunk)
    }
}

impl<R: SeekableReader> Read for BufferedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.pos >= self.cap {
            if buf.len() >= self.buffer.len() {
                let position = self.position();
                let n = self.inner.read(buf)?;
                self.discard_buffer(position + n as u64);
                return Ok(n);
            }
            self.fill_buffer()?;
            if self.cap == 0 {
                return Ok(0);
            }
        }

        let available = self.cap - self.pos;
        let to_read = available.min(buf.len());
        buf[..to_read].copy_from_slice(&self.buffer[self.pos..self.pos + to_read]);
        self.pos += to_read;
        Ok(to_read)
    }
}

impl<R: SeekableReader> Seek for BufferedReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.position().checked_add_signed(delta),
            SeekFrom::End(_) => None,
        };

        if let Some(target) = target {
            let window_end = self.window_start + self.cap as u64;
            if target >= self.window_start && target <= window_end {
                self.pos = (target - self.window_start) as usize;
                return Ok(target);
            }
        }

        let absolute = match pos {
            SeekFrom::Current(delta) => {
                // The underlying reader sits at the end of the window.
                let position = self.position();
                self.inner.seek(SeekFrom::Start(
                    position.checked_add_signed(delta).unwrap_or(0),
                ))?
            }
            other => self.inner.seek(other)?,
        };
        self.discard_buffer(absolute);
        Ok(absolute)
    }
}

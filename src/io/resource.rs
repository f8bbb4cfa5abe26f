//! Byte sources that yield a [`BinaryCursor`]
//!
//! A resource is opened once per parse; the handle it returns owns the bytes
//! (or the file) for as long as the cursor lives and releases them on drop.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use flate2::read::GzDecoder;
use memmap2::Mmap;
use tracing::debug;
use crate::error::Result;
use crate::io::{BinaryCursor, BufferedReader, ByteOrder, SeekableReader};

/// Cursor type handed out by every [`Resource`]
pub type ResourceCursor = BinaryCursor<Box<dyn SeekableReader>>;

/// An abstract resource capable of yielding a binary cursor
pub trait Resource: Send + Sync {
    /// Name used in diagnostics (usually the file name)
    fn name(&self) -> &str;

    /// Opens a fresh reader positioned at offset 0
    fn open(&self) -> Result<Box<dyn SeekableReader>>;

    /// Whether the stored bytes are compressed on disk
    fn is_compressed(&self) -> bool {
        false
    }

    /// Opens a cursor with the given initial byte order
    fn cursor(&self, order: ByteOrder) -> Result<ResourceCursor> {
        BinaryCursor::new(self.open()?, order)
    }
}

/// Resource backed by bytes already in memory
#[derive(Debug, Clone)]
pub struct MemoryResource {
    name: String,
    data: Arc<[u8]>,
}

impl MemoryResource {
    pub fn new(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Number of bytes held
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Resource for MemoryResource {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> Result<Box<dyn SeekableReader>> {
        Ok(Box::new(Cursor::new(Arc::clone(&self.data))))
    }
}

/// Resource backed by a file on disk
///
/// With `use_mmap` the file is memory-mapped; otherwise it is streamed
/// through a [`BufferedReader`].
#[derive(Debug, Clone)]
pub struct FileResource {
    path: PathBuf,
    name: String,
    use_mmap: bool,
}

impl FileResource {
    pub fn new<P: AsRef<Path>>(path: P, use_mmap: bool) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = display_name(&path);
        Self { path, name, use_mmap }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn map(&self) -> Result<Mmap> {
        let file = File::open(&self.path)?;
        // Safety: the mapping is read-only and the crate never writes to
        // the files it parses.
        let mmap = unsafe { Mmap::map(&file)? };

        #[cfg(unix)]
        unsafe {
            libc::madvise(
                mmap.as_ptr() as *mut libc::c_void,
                mmap.len(),
                libc::MADV_SEQUENTIAL,
            );
        }

        Ok(mmap)
    }
}

impl Resource for FileResource {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> Result<Box<dyn SeekableReader>> {
        if self.use_mmap {
            let mmap = self.map()?;
            debug!(path = %self.path.display(), bytes = mmap.len(), "mapped resource");
            return Ok(Box::new(Cursor::new(mmap)));
        }

        let file = File::open(&self.path)?;
        Ok(Box::new(BufferedReader::new(file)))
    }
}

/// Gzip-compressed file, inflated in memory on open
#[derive(Debug, Clone)]
pub struct GzipResource {
    path: PathBuf,
    name: String,
}

impl GzipResource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = display_name(&path);
        Self { path, name }
    }
}

impl Resource for GzipResource {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> Result<Box<dyn SeekableReader>> {
        let file = File::open(&self.path)?;
        let mut decoder = GzDecoder::new(file);
        let mut data = Vec::new();
        decoder.read_to_end(&mut data)?;
        debug!(path = %self.path.display(), inflated = data.len(), "inflated resource");
        Ok(Box::new(Cursor::new(data)))
    }

    fn is_compressed(&self) -> bool {
        true
    }
}

/// Picks a resource implementation from the file extension
pub fn open_resource<P: AsRef<Path>>(path: P, use_mmap: bool) -> Box<dyn Resource> {
    let path = path.as_ref();
    let is_gzip = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));

    if is_gzip {
        Box::new(GzipResource::new(path))
    } else {
        Box::new(FileResource::new(path, use_mmap))
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

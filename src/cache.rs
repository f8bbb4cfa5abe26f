/// Shared cache of parsed grid shift files

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use crossbeam::queue::SegQueue;
use tracing::{debug, info};
use crate::error::Result;
use crate::formats::ntv2::GridShiftFile;

/// Queue length, as a multiple of capacity, past which stale marks are dropped
const COMPACT_FACTOR: usize = 4;

struct CachedGrid {
    file: Arc<GridShiftFile>,
    /// Stamp of the latest use; queue marks with an older stamp are stale
    last_use: AtomicU64,
}

/// Lock-free LRU cache of parsed grid files keyed by path
///
/// Every use pushes a stamped mark onto the queue. Eviction pops marks in
/// order and only removes a file whose latest stamp matches, so a file used
/// since it was queued survives. Concurrent first loads of the same path
/// parse the file once: the entry for that path is held while the loader
/// runs.
pub struct GridCache {
    grids: Arc<DashMap<PathBuf, CachedGrid>>,
    lru: Arc<SegQueue<(PathBuf, u64)>>,
    clock: Arc<AtomicU64>,
    max_grids: usize,
    use_mmap: bool,
}

impl GridCache {
    /// Creates a new grid cache
    ///
    /// # Arguments
    /// * `max_grids` - Maximum number of parsed files kept (at least 1)
    /// * `use_mmap` - Whether files are memory-mapped while parsing
    pub fn new(max_grids: usize, use_mmap: bool) -> Self {
        Self {
            grids: Arc::new(DashMap::new()),
            lru: Arc::new(SegQueue::new()),
            clock: Arc::new(AtomicU64::new(0)),
            max_grids: max_grids.max(1),
            use_mmap,
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Records a use of `key` whose entry already carries `stamp`
    fn mark(&self, key: PathBuf, stamp: u64) {
        self.lru.push((key, stamp));
        if self.lru.len() > self.max_grids * COMPACT_FACTOR {
            self.compact();
        }
    }

    /// Drops queue marks superseded by a later use
    fn compact(&self) {
        for _ in 0..self.lru.len() {
            let Some((key, stamp)) = self.lru.pop() else {
                break;
            };
            let live = self
                .grids
                .get(&key)
                .is_some_and(|entry| entry.last_use.load(Ordering::Relaxed) == stamp);
            if live {
                self.lru.push((key, stamp));
            }
        }
    }

    /// Gets a parsed file without loading it
    pub fn get<P: AsRef<Path>>(&self, path: P) -> Option<Arc<GridShiftFile>> {
        let key = path.as_ref().to_path_buf();
        let stamp = self.tick();
        let file = {
            let entry = self.grids.get(&key)?;
            entry.last_use.store(stamp, Ordering::Relaxed);
            Arc::clone(&entry.file)
        };
        self.mark(key, stamp);
        Some(file)
    }

    /// Returns the parsed file at `path`, parsing it on first use
    pub fn get_or_load<P: AsRef<Path>>(&self, path: P) -> Result<Arc<GridShiftFile>> {
        let use_mmap = self.use_mmap;
        self.get_or_insert_with(path.as_ref(), |path| GridShiftFile::open(path, use_mmap))
    }

    /// Returns the cached value for `path`, running `load` on a miss
    pub fn get_or_insert_with<F>(&self, path: &Path, load: F) -> Result<Arc<GridShiftFile>>
    where
        F: FnOnce(&Path) -> Result<GridShiftFile>,
    {
        if let Some(file) = self.get(path) {
            return Ok(file);
        }

        self.evict_to(self.max_grids - 1);

        let key = path.to_path_buf();
        let stamp = self.tick();
        let file = match self.grids.entry(key.clone()) {
            Entry::Occupied(entry) => {
                entry.get().last_use.store(stamp, Ordering::Relaxed);
                Arc::clone(&entry.get().file)
            }
            Entry::Vacant(entry) => {
                let file = Arc::new(load(path)?);
                info!(path = %path.display(), grids = file.grids().len(), "cached grid file");
                entry.insert(CachedGrid {
                    file: Arc::clone(&file),
                    last_use: AtomicU64::new(stamp),
                });
                file
            }
        };
        self.mark(key, stamp);
        Ok(file)
    }

    fn evict_to(&self, target: usize) {
        while self.grids.len() > target {
            let Some((old, stamp)) = self.lru.pop() else {
                break;
            };
            let evicted = self
                .grids
                .remove_if(&old, |_, cached| cached.last_use.load(Ordering::Relaxed) == stamp);
            if evicted.is_some() {
                debug!(path = %old.display(), "evicted grid file");
            }
        }
    }

    /// Drops a cached file
    pub fn remove<P: AsRef<Path>>(&self, path: P) -> Option<Arc<GridShiftFile>> {
        self.grids.remove(path.as_ref()).map(|(_, cached)| cached.file)
    }

    /// Clears the cache
    pub fn clear(&self) {
        self.grids.clear();

        while self.lru.pop().is_some() {}
    }

    /// Returns the current number of cached files
    pub fn len(&self) -> usize {
        self.grids.len()
    }

    /// Returns whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    /// Returns cache statistics
    pub fn stats(&self) -> CacheStats {
        let sub_grids = self.grids.iter().map(|entry| entry.value().file.grids().len()).sum();
        let nodes = self
            .grids
            .iter()
            .map(|entry| entry.value().file.grids().iter().map(|g| g.node_count()).sum::<usize>())
            .sum();

        CacheStats {
            file_count: self.grids.len(),
            sub_grids,
            nodes,
            max_grids: self.max_grids,
        }
    }
}

impl Clone for GridCache {
    fn clone(&self) -> Self {
        Self {
            grids: Arc::clone(&self.grids),
            lru: Arc::clone(&self.lru),
            clock: Arc::clone(&self.clock),
            max_grids: self.max_grids,
            use_mmap: self.use_mmap,
        }
    }
}

impl Default for GridCache {
    fn default() -> Self {
        Self::new(8, true)
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of files currently cached
    pub file_count: usize,
    /// Sub-grids across all cached files
    pub sub_grids: usize,
    /// Lattice nodes across all cached files
    pub nodes: usize,
    /// Maximum number of files
    pub max_grids: usize,
}

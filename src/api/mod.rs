//! HTTP API over the registry, the grid shift engine and the directory decoder

pub mod handlers;
pub mod models;
pub mod routes;

use std::sync::Arc;
use tracing::info;
use crate::cache::GridCache;
use crate::config::EngineConfig;
use crate::crs::CrsRegistry;
use crate::error::Result;
use crate::formats::tiff::TiffMetadataLoader;
use crate::projection::GridShift;

pub use routes::create_router;

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<CrsRegistry>,
    /// `None` when no grid files are configured; shift endpoints then fail
    pub grids: Option<Arc<GridShift>>,
    pub loader: TiffMetadataLoader,
}

impl AppState {
    pub fn new(registry: CrsRegistry, grids: Option<GridShift>, loader: TiffMetadataLoader) -> Self {
        Self {
            registry: Arc::new(registry),
            grids: grids.map(Arc::new),
            loader,
        }
    }

    /// Builds the registry and grid engine described by a config
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let mut registry = CrsRegistry::with_builtin();
        if let Some(path) = &config.catalog_path {
            registry.load_csv_file(path)?;
        }

        let grids = if config.grids.is_empty() {
            None
        } else {
            let cache = GridCache::new(config.grid_cache_size, config.use_mmap);
            let files = config
                .grids
                .iter()
                .map(|path| cache.get_or_load(path))
                .collect::<Result<Vec<_>>>()?;
            Some(GridShift::from_files(files))
        };

        info!(
            systems = registry.len(),
            grid_files = config.grids.len(),
            "initialized engine state"
        );

        Ok(Self::new(registry, grids, TiffMetadataLoader::new(config.ascii_terminator)))
    }
}

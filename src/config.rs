//! Engine configuration
//!
//! Loaded from a JSON file (every field optional) and then overridden by
//! `SKYFOREST_*` environment variables.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::error::{Error, Result};
use crate::io::Terminator;

/// Bind address override
pub const ENV_BIND: &str = "SKYFOREST_BIND";
/// Grid file list override, separated like `PATH`
pub const ENV_GRIDS: &str = "SKYFOREST_GRIDS";
/// CRS catalog CSV override
pub const ENV_CATALOG: &str = "SKYFOREST_CATALOG";
/// Memory-map toggle override (`true`/`false`/`1`/`0`)
pub const ENV_USE_MMAP: &str = "SKYFOREST_USE_MMAP";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// NTv2 files searched in order by the grid shift engine
    pub grids: Vec<PathBuf>,
    /// Extra CRS definitions (`code,name,kind,horizontal,vertical`)
    pub catalog_path: Option<PathBuf>,
    pub use_mmap: bool,
    /// Parsed grid files kept in memory
    pub grid_cache_size: usize,
    pub ascii_terminator: Terminator,
    pub bind_address: String,
    /// Request body limit in bytes
    pub body_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grids: Vec::new(),
            catalog_path: None,
            use_mmap: true,
            grid_cache_size: 8,
            ascii_terminator: Terminator::Preserve,
            bind_address: "0.0.0.0:3000".to_string(),
            body_limit: 100 * 1024 * 1024,
        }
    }
}

impl EngineConfig {
    /// Parses a JSON document; missing fields keep their defaults
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Config(format!("invalid config: {}", e)))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_json(&text)
    }

    /// Loads `path` if given, else defaults, then applies the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env()
    }

    /// Applies `SKYFOREST_*` overrides from the process environment
    pub fn with_env(self) -> Result<Self> {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides from any variable lookup
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(bind) = lookup(ENV_BIND) {
            self.bind_address = bind;
        }
        if let Some(grids) = lookup(ENV_GRIDS) {
            self.grids = env::split_paths(&grids)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }
        if let Some(catalog) = lookup(ENV_CATALOG) {
            self.catalog_path = (!catalog.is_empty()).then(|| PathBuf::from(catalog));
        }
        if let Some(flag) = lookup(ENV_USE_MMAP) {
            self.use_mmap = parse_flag(&flag)
                .ok_or_else(|| Error::Config(format!("{} must be true or false, got {:?}", ENV_USE_MMAP, flag)))?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid_cache_size == 0 {
            return Err(Error::Config("grid_cache_size must be at least 1".to_string()));
        }
        if self.body_limit == 0 {
            return Err(Error::Config("body_limit must be positive".to_string()));
        }
        if self.bind_address.is_empty() {
            return Err(Error::Config("bind_address is empty".to_string()));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

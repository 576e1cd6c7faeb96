//! Configuration structs and their defaults.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default tile server: OpenStreetMap's standard layer.
pub const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Default memory cache size (256 MiB).
pub const DEFAULT_MEMORY_CACHE_SIZE: usize = 256 * 1024 * 1024;

/// Default HTTP timeout in seconds.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 30;

/// Default number of concurrent tile downloads.
pub const DEFAULT_DOWNLOAD_CONCURRENT: usize = 8;

/// Contents of `config.ini`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub layer: LayerSettings,
    pub control: ControlSettings,
    pub cache: CacheSettings,
    pub download: DownloadSettings,
}

/// `[layer]` section, plus extra template values from `[params]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSettings {
    pub url: String,
    /// Raw subdomain list, either `abc` or `a,b,c`.
    pub subdomains: String,
    pub tile_size: u32,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub zoom_offset: i32,
    pub zoom_reverse: bool,
    pub detect_retina: bool,
    pub params: BTreeMap<String, String>,
}

impl Default for LayerSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_TILE_URL.to_string(),
            subdomains: crate::layer::DEFAULT_SUBDOMAINS.to_string(),
            tile_size: crate::layer::DEFAULT_TILE_SIZE,
            min_zoom: 0,
            max_zoom: crate::layer::DEFAULT_LAYER_MAX_ZOOM,
            zoom_offset: 0,
            zoom_reverse: false,
            detect_retina: false,
            params: BTreeMap::new(),
        }
    }
}

/// `[control]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSettings {
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            min_zoom: crate::control::DEFAULT_CONTROL_MIN_ZOOM,
            max_zoom: crate::control::DEFAULT_CONTROL_MAX_ZOOM,
        }
    }
}

/// Storage backend for saved tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    #[default]
    Disk,
    Memory,
}

impl CacheBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheBackend::Disk => "disk",
            CacheBackend::Memory => "memory",
        }
    }
}

impl fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "disk" => Ok(CacheBackend::Disk),
            "memory" => Ok(CacheBackend::Memory),
            _ => Err("must be 'disk' or 'memory'".to_string()),
        }
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub backend: CacheBackend,
    pub directory: PathBuf,
    pub memory_size: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            directory: super::file::config_directory().join("tiles"),
            memory_size: DEFAULT_MEMORY_CACHE_SIZE,
        }
    }
}

/// `[download]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadSettings {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Tiles downloaded at once during a bulk save.
    pub concurrent: usize,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            concurrent: DEFAULT_DOWNLOAD_CONCURRENT,
        }
    }
}

//! Application configuration for TileVaultApp.
//!
//! `AppConfig` combines everything needed to bootstrap the offline cache:
//! the tile layer, control bounds, storage backend and download settings.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::{CacheBackend, ConfigFile, DEFAULT_MEMORY_CACHE_SIZE, DEFAULT_TILE_URL};
use crate::control::ControlOptions;
use crate::layer::{DisplayProfile, LayerOptions};
use crate::store::DEFAULT_CONCURRENCY;

/// Storage backend selection for the application.
#[derive(Clone, Debug, PartialEq)]
pub enum StorageConfig {
    /// One file per tile under `directory`.
    Disk { directory: PathBuf },
    /// Size-bounded in-process cache, lost on exit.
    Memory { max_size_bytes: u64 },
}

/// Application configuration combining all component configs.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Tile URL template.
    pub url: String,

    pub layer: LayerOptions,

    pub control: ControlOptions,

    pub storage: StorageConfig,

    /// Display the layer renders on, used for retina detection.
    pub display: DisplayProfile,

    /// HTTP request timeout.
    pub timeout: Duration,

    /// Tiles downloaded at once during a bulk save.
    pub concurrency: usize,
}

impl AppConfig {
    /// Create a config for `url` with default options and a memory backend.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            layer: LayerOptions::default(),
            control: ControlOptions::default(),
            storage: StorageConfig::Memory {
                max_size_bytes: DEFAULT_MEMORY_CACHE_SIZE as u64,
            },
            display: DisplayProfile::default(),
            timeout: crate::store::http::DEFAULT_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Create application config from the configuration file.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        let storage = match config.cache.backend {
            CacheBackend::Disk => StorageConfig::Disk {
                directory: config.cache.directory.clone(),
            },
            CacheBackend::Memory => StorageConfig::Memory {
                max_size_bytes: config.cache.memory_size as u64,
            },
        };

        Self {
            url: config.layer.url.clone(),
            layer: LayerOptions::from_config(&config.layer),
            control: ControlOptions::from_config(&config.control),
            storage,
            display: DisplayProfile::default(),
            timeout: Duration::from_secs(config.download.timeout),
            concurrency: config.download.concurrent,
        }
    }

    pub fn with_layer(mut self, layer: LayerOptions) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_control(mut self, control: ControlOptions) -> Self {
        self.control = control;
        self
    }

    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_display(mut self, display: DisplayProfile) -> Self {
        self.display = display;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_URL)
    }
}

//! Application bootstrap implementation.
//!
//! `TileVaultApp` wires the storage backend, HTTP client, tile database,
//! offline layer and control together from an [`AppConfig`].

use std::sync::Arc;

use tracing::info;

use super::config::{AppConfig, StorageConfig};
use super::error::AppError;
use crate::control::{Confirm, OfflineControl};
use crate::events::EventBus;
use crate::layer::OfflineTileLayer;
use crate::store::{AsyncHttpClient, AsyncReqwestClient, Cache, DiskCache, MemoryCache, TileDb};

/// Snapshot of the storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub backend: &'static str,
    pub entries: u64,
    pub size_bytes: u64,
    /// `None` for unbounded backends.
    pub max_size_bytes: Option<u64>,
}

/// A ready-to-use offline tile cache.
///
/// # Example
///
/// ```no_run
/// use tilevault::app::{AppConfig, TileVaultApp};
/// use tilevault::config::ConfigFile;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AppConfig::from_config_file(&ConfigFile::load()?);
/// let app = TileVaultApp::start(config).await?;
/// println!("{} tiles stored", app.cache_stats().entries);
/// # Ok(())
/// # }
/// ```
pub struct TileVaultApp {
    layer: Arc<OfflineTileLayer>,
    control: OfflineControl,
    cache: Arc<dyn Cache>,
    events: EventBus,
    config: AppConfig,
}

impl TileVaultApp {
    /// Start the application, downloading over reqwest.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be opened, the HTTP
    /// client cannot be built or the layer options are invalid.
    pub async fn start(config: AppConfig) -> Result<Self, AppError> {
        let client = AsyncReqwestClient::with_timeout(config.timeout)?;
        Self::start_with_client(config, client).await
    }

    /// Start the application with a custom HTTP client.
    pub async fn start_with_client<C>(config: AppConfig, client: C) -> Result<Self, AppError>
    where
        C: AsyncHttpClient + 'static,
    {
        info!(url = %config.url, "Starting TileVault");

        let cache = Self::open_storage(&config.storage).await?;

        let db = TileDb::new(Arc::clone(&cache), client).with_concurrency(config.concurrency);
        let layer = Arc::new(OfflineTileLayer::new(
            &config.url,
            Arc::new(db),
            config.layer.clone(),
            config.display,
        )?);

        if layer.is_retina() {
            info!(
                tile_size = layer.options().tile_size,
                zoom_offset = layer.options().zoom_offset,
                "Retina tiles enabled"
            );
        }

        let events = EventBus::default();
        let control = OfflineControl::new(Arc::clone(&layer), config.control)
            .with_events(events.clone());

        Ok(Self {
            layer,
            control,
            cache,
            events,
            config,
        })
    }

    async fn open_storage(storage: &StorageConfig) -> Result<Arc<dyn Cache>, AppError> {
        let cache: Arc<dyn Cache> = match storage {
            StorageConfig::Disk { directory } => Arc::new(DiskCache::open(directory).await?),
            StorageConfig::Memory { max_size_bytes } => {
                Arc::new(MemoryCache::new(*max_size_bytes))
            }
        };
        info!(backend = cache.name(), "Tile storage ready");
        Ok(cache)
    }

    /// Replace the control's confirmation prompts.
    pub fn with_confirm(mut self, confirm: impl Confirm + 'static) -> Self {
        self.control = self.control.with_confirm(confirm);
        self
    }

    pub fn layer(&self) -> &Arc<OfflineTileLayer> {
        &self.layer
    }

    pub fn control(&self) -> &OfflineControl {
        &self.control
    }

    /// Event bus the control publishes on.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            backend: self.cache.name(),
            entries: self.cache.entry_count(),
            size_bytes: self.cache.size_bytes(),
            max_size_bytes: self.cache.max_size_bytes(),
        }
    }
}

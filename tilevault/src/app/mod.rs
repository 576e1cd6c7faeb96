//! Application bootstrap.
//!
//! `TileVaultApp` builds the full offline cache from configuration:
//!
//! ```text
//! ConfigFile ──► AppConfig ──► TileVaultApp
//!                                ├── Cache (DiskCache | MemoryCache)
//!                                ├── TileDb (Cache + AsyncHttpClient)
//!                                ├── OfflineTileLayer (TileScheme + TileDb)
//!                                └── OfflineControl ──► EventBus
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::{CacheStats, TileVaultApp};
pub use config::{AppConfig, StorageConfig};
pub use error::AppError;

//! User configuration (`~/.tilevault/config.ini`).
//!
//! # Example
//!
//! ```no_run
//! use tilevault::config::{ConfigFile, ConfigKey};
//!
//! let mut config = ConfigFile::load()?;
//! let key: ConfigKey = "control.min_zoom".parse()?;
//! key.set(&mut config, "12")?;
//! config.save()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod file;
mod keys;
mod parser;
mod settings;
mod size;
mod writer;

pub use file::{config_directory, config_file_path, log_directory, ConfigFileError};
pub use keys::{ConfigKey, ConfigKeyError};
pub use settings::{
    CacheBackend, CacheSettings, ConfigFile, ControlSettings, DownloadSettings, LayerSettings,
    DEFAULT_DOWNLOAD_CONCURRENT, DEFAULT_DOWNLOAD_TIMEOUT_SECS, DEFAULT_MEMORY_CACHE_SIZE,
    DEFAULT_TILE_URL,
};
pub use size::{format_size, parse_size, SizeParseError};

//! Configuration key access and validation.
//!
//! A type-safe interface for getting and setting configuration values by
//! `section.key` name, as used by `tilevault config get/set`.

use std::str::FromStr;

use thiserror::Error;

use super::parser::{
    expand_tilde, parse_bool, parse_positive, parse_tile_size, parse_url, parse_zoom,
    parse_zoom_offset,
};
use super::settings::{CacheBackend, ConfigFile};
use super::size::{format_size, parse_size};

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    // Layer settings
    LayerUrl,
    LayerSubdomains,
    LayerTileSize,
    LayerMinZoom,
    LayerMaxZoom,
    LayerZoomOffset,
    LayerZoomReverse,
    LayerDetectRetina,

    // Control settings
    ControlMinZoom,
    ControlMaxZoom,

    // Cache settings
    CacheBackend,
    CacheDirectory,
    CacheMemorySize,

    // Download settings
    DownloadTimeout,
    DownloadConcurrent,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|key| key.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

impl ConfigKey {
    /// Get the canonical key name (e.g., "layer.url").
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::LayerUrl => "layer.url",
            ConfigKey::LayerSubdomains => "layer.subdomains",
            ConfigKey::LayerTileSize => "layer.tile_size",
            ConfigKey::LayerMinZoom => "layer.min_zoom",
            ConfigKey::LayerMaxZoom => "layer.max_zoom",
            ConfigKey::LayerZoomOffset => "layer.zoom_offset",
            ConfigKey::LayerZoomReverse => "layer.zoom_reverse",
            ConfigKey::LayerDetectRetina => "layer.detect_retina",
            ConfigKey::ControlMinZoom => "control.min_zoom",
            ConfigKey::ControlMaxZoom => "control.max_zoom",
            ConfigKey::CacheBackend => "cache.backend",
            ConfigKey::CacheDirectory => "cache.directory",
            ConfigKey::CacheMemorySize => "cache.memory_size",
            ConfigKey::DownloadTimeout => "download.timeout",
            ConfigKey::DownloadConcurrent => "download.concurrent",
        }
    }

    /// Get the section name (e.g., "layer").
    pub fn section(&self) -> &'static str {
        self.name().split('.').next().unwrap_or("")
    }

    /// Get the key name within its section (e.g., "url").
    pub fn key_name(&self) -> &'static str {
        self.name().split('.').nth(1).unwrap_or("")
    }

    /// Get the value from a config file as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::LayerUrl => config.layer.url.clone(),
            ConfigKey::LayerSubdomains => config.layer.subdomains.clone(),
            ConfigKey::LayerTileSize => config.layer.tile_size.to_string(),
            ConfigKey::LayerMinZoom => config.layer.min_zoom.to_string(),
            ConfigKey::LayerMaxZoom => config.layer.max_zoom.to_string(),
            ConfigKey::LayerZoomOffset => config.layer.zoom_offset.to_string(),
            ConfigKey::LayerZoomReverse => config.layer.zoom_reverse.to_string(),
            ConfigKey::LayerDetectRetina => config.layer.detect_retina.to_string(),
            ConfigKey::ControlMinZoom => config.control.min_zoom.to_string(),
            ConfigKey::ControlMaxZoom => config.control.max_zoom.to_string(),
            ConfigKey::CacheBackend => config.cache.backend.to_string(),
            ConfigKey::CacheDirectory => config.cache.directory.display().to_string(),
            ConfigKey::CacheMemorySize => format_size(config.cache.memory_size),
            ConfigKey::DownloadTimeout => config.download.timeout.to_string(),
            ConfigKey::DownloadConcurrent => config.download.concurrent.to_string(),
        }
    }

    /// Validate `value` and store it in `config`.
    ///
    /// `config` is left untouched when validation fails.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        let invalid = |reason: String| ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason,
        };

        match self {
            ConfigKey::LayerUrl => config.layer.url = parse_url(value).map_err(invalid)?,
            ConfigKey::LayerSubdomains => config.layer.subdomains = value.trim().to_string(),
            ConfigKey::LayerTileSize => {
                config.layer.tile_size = parse_tile_size(value).map_err(invalid)?
            }
            ConfigKey::LayerMinZoom => config.layer.min_zoom = parse_zoom(value).map_err(invalid)?,
            ConfigKey::LayerMaxZoom => config.layer.max_zoom = parse_zoom(value).map_err(invalid)?,
            ConfigKey::LayerZoomOffset => {
                config.layer.zoom_offset = parse_zoom_offset(value).map_err(invalid)?
            }
            ConfigKey::LayerZoomReverse => {
                config.layer.zoom_reverse = parse_bool(value).map_err(invalid)?
            }
            ConfigKey::LayerDetectRetina => {
                config.layer.detect_retina = parse_bool(value).map_err(invalid)?
            }
            ConfigKey::ControlMinZoom => {
                config.control.min_zoom = parse_zoom(value).map_err(invalid)?
            }
            ConfigKey::ControlMaxZoom => {
                config.control.max_zoom = parse_zoom(value).map_err(invalid)?
            }
            ConfigKey::CacheBackend => {
                config.cache.backend = value.parse::<CacheBackend>().map_err(invalid)?
            }
            ConfigKey::CacheDirectory => {
                let value = value.trim();
                if value.is_empty() {
                    return Err(invalid("must not be empty".to_string()));
                }
                config.cache.directory = expand_tilde(value);
            }
            ConfigKey::CacheMemorySize => {
                config.cache.memory_size =
                    parse_size(value).map_err(|e| invalid(e.to_string()))?
            }
            ConfigKey::DownloadTimeout => {
                config.download.timeout = parse_positive(value).map_err(invalid)?
            }
            ConfigKey::DownloadConcurrent => {
                config.download.concurrent = parse_positive(value).map_err(invalid)?
            }
        }
        Ok(())
    }

    /// Get all supported configuration keys.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::LayerUrl,
            ConfigKey::LayerSubdomains,
            ConfigKey::LayerTileSize,
            ConfigKey::LayerMinZoom,
            ConfigKey::LayerMaxZoom,
            ConfigKey::LayerZoomOffset,
            ConfigKey::LayerZoomReverse,
            ConfigKey::LayerDetectRetina,
            ConfigKey::ControlMinZoom,
            ConfigKey::ControlMaxZoom,
            ConfigKey::CacheBackend,
            ConfigKey::CacheDirectory,
            ConfigKey::CacheMemorySize,
            ConfigKey::DownloadTimeout,
            ConfigKey::DownloadConcurrent,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names_round_trip() {
        for key in ConfigKey::all() {
            assert_eq!(key.name().parse::<ConfigKey>().unwrap(), *key);
        }
        assert_eq!(
            "LAYER.URL".parse::<ConfigKey>().unwrap(),
            ConfigKey::LayerUrl
        );
    }

    #[test]
    fn test_unknown_key() {
        assert!(matches!(
            "layer.colour".parse::<ConfigKey>(),
            Err(ConfigKeyError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_section() {
        assert_eq!(ConfigKey::DownloadConcurrent.section(), "download");
        assert_eq!(ConfigKey::DownloadConcurrent.key_name(), "concurrent");
    }

    #[test]
    fn test_set_and_get() {
        let mut config = ConfigFile::default();

        ConfigKey::ControlMinZoom.set(&mut config, "12").unwrap();
        ConfigKey::CacheBackend.set(&mut config, "Memory").unwrap();
        ConfigKey::CacheMemorySize.set(&mut config, "1GB").unwrap();
        ConfigKey::LayerDetectRetina.set(&mut config, "true").unwrap();

        assert_eq!(ConfigKey::ControlMinZoom.get(&config), "12");
        assert_eq!(ConfigKey::CacheBackend.get(&config), "memory");
        assert_eq!(ConfigKey::CacheMemorySize.get(&config), "1GB");
        assert_eq!(ConfigKey::LayerDetectRetina.get(&config), "true");
    }

    #[test]
    fn test_invalid_value_leaves_config_untouched() {
        let mut config = ConfigFile::default();
        let err = ConfigKey::LayerMaxZoom.set(&mut config, "99").unwrap_err();

        assert!(err.to_string().contains("layer.max_zoom"));
        assert_eq!(config, ConfigFile::default());
    }
}

//! Tile layer options.

use std::collections::BTreeMap;

use super::LayerError;
use crate::config::LayerSettings;
use crate::coord::MAX_ZOOM;

/// Default subdomains used by most `{s}` tile servers.
pub const DEFAULT_SUBDOMAINS: &str = "abc";

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Default maximum zoom for a tile layer.
pub const DEFAULT_LAYER_MAX_ZOOM: u8 = 18;

/// Options controlling how tile coordinates map to URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerOptions {
    /// Subdomains substituted for `{s}`; the first one is canonical.
    pub subdomains: Vec<String>,
    /// Tile edge length in pixels.
    pub tile_size: u32,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Added to the zoom level sent to the server.
    pub zoom_offset: i32,
    /// Count server zoom down from `max_zoom` instead of up from zero.
    pub zoom_reverse: bool,
    /// Request half-size tiles one zoom deeper on high-density displays.
    pub detect_retina: bool,
    /// Values for non built-in template placeholders.
    pub params: BTreeMap<String, String>,
}

impl Default for LayerOptions {
    fn default() -> Self {
        Self {
            subdomains: parse_subdomains(DEFAULT_SUBDOMAINS),
            tile_size: DEFAULT_TILE_SIZE,
            min_zoom: 0,
            max_zoom: DEFAULT_LAYER_MAX_ZOOM,
            zoom_offset: 0,
            zoom_reverse: false,
            detect_retina: false,
            params: BTreeMap::new(),
        }
    }
}

impl LayerOptions {
    /// Build options from the `[layer]` and `[params]` config sections.
    pub fn from_config(settings: &LayerSettings) -> Self {
        Self {
            subdomains: parse_subdomains(&settings.subdomains),
            tile_size: settings.tile_size,
            min_zoom: settings.min_zoom,
            max_zoom: settings.max_zoom,
            zoom_offset: settings.zoom_offset,
            zoom_reverse: settings.zoom_reverse,
            detect_retina: settings.detect_retina,
            params: settings.params.clone(),
        }
    }

    /// Set the subdomains from a string such as `"abc"` or `"a,b,c"`.
    pub fn with_subdomains(mut self, subdomains: &str) -> Self {
        self.subdomains = parse_subdomains(subdomains);
        self
    }

    /// Set the zoom range.
    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    /// Set the tile size.
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Enable or disable retina detection.
    pub fn with_detect_retina(mut self, detect_retina: bool) -> Self {
        self.detect_retina = detect_retina;
        self
    }

    /// Enable or disable reversed zoom numbering.
    pub fn with_zoom_reverse(mut self, zoom_reverse: bool) -> Self {
        self.zoom_reverse = zoom_reverse;
        self
    }

    /// Add a value for a custom template placeholder.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Adjusts size and zoom bounds for retina tiles.
    ///
    /// Returns true when retina tiles are in use. Must run once, before any
    /// coordinate math.
    pub(crate) fn apply_retina(&mut self, display: DisplayProfile) -> bool {
        if !(self.detect_retina && display.is_retina() && self.max_zoom > 0) {
            return false;
        }

        self.tile_size /= 2;

        if !self.zoom_reverse {
            self.zoom_offset += 1;
            self.max_zoom -= 1;
        } else {
            self.zoom_offset -= 1;
            self.min_zoom = self.min_zoom.saturating_add(1);
        }

        // A single-level layer keeps one usable level after the shift.
        self.min_zoom = self.min_zoom.min(self.max_zoom);

        true
    }

    pub(crate) fn validate(&self) -> Result<(), LayerError> {
        if self.tile_size == 0 {
            return Err(LayerError::Config(
                "tile size must be greater than zero".to_string(),
            ));
        }
        if self.max_zoom > MAX_ZOOM {
            return Err(LayerError::Config(format!(
                "max zoom {} exceeds the supported maximum of {}",
                self.max_zoom, MAX_ZOOM
            )));
        }
        if self.min_zoom > self.max_zoom {
            return Err(LayerError::Config(format!(
                "min zoom {} is greater than max zoom {}",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.subdomains.iter().any(|s| s.is_empty()) {
            return Err(LayerError::Config(
                "subdomain list contains an empty entry".to_string(),
            ));
        }
        Ok(())
    }
}

/// Splits a subdomain list.
///
/// A comma-separated string is split on commas; otherwise every character is
/// one subdomain, so `"abc"` becomes `["a", "b", "c"]`.
pub fn parse_subdomains(value: &str) -> Vec<String> {
    let value = value.trim();
    if value.contains(',') {
        value.split(',').map(|s| s.trim().to_string()).collect()
    } else {
        value.chars().map(|c| c.to_string()).collect()
    }
}

/// Properties of the display the map renders on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayProfile {
    /// Physical pixels per CSS pixel.
    pub device_pixel_ratio: f64,
}

impl DisplayProfile {
    pub fn new(device_pixel_ratio: f64) -> Self {
        Self { device_pixel_ratio }
    }

    pub fn retina() -> Self {
        Self::new(2.0)
    }

    pub fn is_retina(&self) -> bool {
        self.device_pixel_ratio > 1.0
    }
}

impl Default for DisplayProfile {
    fn default() -> Self {
        Self::new(1.0)
    }
}

//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.
//! The value parsers are shared with [`super::keys`].

use std::path::PathBuf;

use ini::Ini;

use super::file::ConfigFileError;
use super::settings::{CacheBackend, ConfigFile};
use super::size::parse_size;
use crate::coord::MAX_ZOOM;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [layer] section
    if let Some(section) = ini.section(Some("layer")) {
        for (key, value) in section.iter() {
            let invalid = |reason: String| invalid_value("layer", key, value, reason);
            match key {
                "url" => config.layer.url = parse_url(value).map_err(invalid)?,
                "subdomains" => config.layer.subdomains = value.trim().to_string(),
                "tile_size" => config.layer.tile_size = parse_tile_size(value).map_err(invalid)?,
                "min_zoom" => config.layer.min_zoom = parse_zoom(value).map_err(invalid)?,
                "max_zoom" => config.layer.max_zoom = parse_zoom(value).map_err(invalid)?,
                "zoom_offset" => {
                    config.layer.zoom_offset = parse_zoom_offset(value).map_err(invalid)?
                }
                "zoom_reverse" => config.layer.zoom_reverse = parse_bool(value).map_err(invalid)?,
                "detect_retina" => config.layer.detect_retina = parse_bool(value).map_err(invalid)?,
                _ => {}
            }
        }
    }

    // [params] section: extra URL template values
    if let Some(section) = ini.section(Some("params")) {
        for (key, value) in section.iter() {
            config
                .layer
                .params
                .insert(key.to_string(), value.trim().to_string());
        }
    }

    // [control] section
    if let Some(section) = ini.section(Some("control")) {
        if let Some(v) = section.get("min_zoom") {
            config.control.min_zoom =
                parse_zoom(v).map_err(|r| invalid_value("control", "min_zoom", v, r))?;
        }
        if let Some(v) = section.get("max_zoom") {
            config.control.max_zoom =
                parse_zoom(v).map_err(|r| invalid_value("control", "max_zoom", v, r))?;
        }
    }

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("backend") {
            config.cache.backend = v
                .parse::<CacheBackend>()
                .map_err(|r| invalid_value("cache", "backend", v, r))?;
        }
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.cache.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("memory_size") {
            config.cache.memory_size = parse_size(v)
                .map_err(|e| invalid_value("cache", "memory_size", v, e.to_string()))?;
        }
    }

    // [download] section
    if let Some(section) = ini.section(Some("download")) {
        if let Some(v) = section.get("timeout") {
            config.download.timeout = parse_positive::<u64>(v)
                .map_err(|r| invalid_value("download", "timeout", v, r))?;
        }
        if let Some(v) = section.get("concurrent") {
            config.download.concurrent = parse_positive::<usize>(v)
                .map_err(|r| invalid_value("download", "concurrent", v, r))?;
        }
    }

    Ok(config)
}

fn invalid_value(section: &str, key: &str, value: &str, reason: String) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason,
    }
}

pub(super) fn parse_url(value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("must not be empty".to_string());
    }
    crate::template::UrlTemplate::check_syntax(value).map_err(|e| e.to_string())?;
    Ok(value.to_string())
}

pub(super) fn parse_zoom(value: &str) -> Result<u8, String> {
    let reason = || format!("must be an integer between 0 and {}", MAX_ZOOM);
    let zoom: u8 = value.trim().parse().map_err(|_| reason())?;
    if zoom > MAX_ZOOM {
        return Err(reason());
    }
    Ok(zoom)
}

pub(super) fn parse_zoom_offset(value: &str) -> Result<i32, String> {
    value
        .trim()
        .parse()
        .map_err(|_| "must be an integer".to_string())
}

pub(super) fn parse_tile_size(value: &str) -> Result<u32, String> {
    parse_positive(value)
}

pub(super) fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err("must be true or false".to_string()),
    }
}

pub(super) fn parse_positive<T>(value: &str) -> Result<T, String>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let reason = || "must be a positive integer".to_string();
    let parsed: T = value.trim().parse().map_err(|_| reason())?;
    if parsed <= T::default() {
        return Err(reason());
    }
    Ok(parsed)
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;
use super::size::format_size;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let layer = &config.layer;

    let mut out = format!(
        r#"[layer]
; Tile URL template. Placeholders: {{s}} subdomain, {{x}} {{y}} {{z}} tile,
; {{-y}} TMS row, {{r}} retina suffix, any other {{name}} from [params]
url = {}
; Subdomains for {{s}}, either "abc" or "a,b,c". The first one names stored tiles.
subdomains = {}
; Tile edge length in pixels
tile_size = {}
min_zoom = {}
max_zoom = {}
; Added to the zoom level sent to the server
zoom_offset = {}
; Count server zoom down from max_zoom
zoom_reverse = {}
; Use half-size tiles one zoom deeper on high-density displays
detect_retina = {}

[control]
; Saving is refused below min_zoom and stops at max_zoom
min_zoom = {}
max_zoom = {}

[cache]
; Where saved tiles live: disk or memory
backend = {}
directory = {}
; Memory backend size limit (e.g. 256MB, 1GB)
memory_size = {}

[download]
; Request timeout in seconds
timeout = {}
; Tiles downloaded at once during a save
concurrent = {}
"#,
        layer.url,
        layer.subdomains,
        layer.tile_size,
        layer.min_zoom,
        layer.max_zoom,
        layer.zoom_offset,
        layer.zoom_reverse,
        layer.detect_retina,
        config.control.min_zoom,
        config.control.max_zoom,
        config.cache.backend,
        path_to_string(&config.cache.directory),
        format_size(config.cache.memory_size),
        config.download.timeout,
        config.download.concurrent,
    );

    if !layer.params.is_empty() {
        out.push_str("\n[params]\n; Values for custom URL template placeholders\n");
        for (name, value) in &layer.params {
            out.push_str(&format!("{} = {}\n", name, value));
        }
    }

    out
}

/// Convert a path to string, collapsing the home directory to `~`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ini::Ini;

    #[test]
    fn test_output_is_valid_ini() {
        let content = to_config_string(&ConfigFile::default());
        let ini = Ini::load_from_str(&content).unwrap();

        let layer = ini.section(Some("layer")).unwrap();
        assert_eq!(
            layer.get("url"),
            Some("https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png")
        );
        assert_eq!(ini.section(Some("control")).unwrap().get("max_zoom"), Some("19"));
        assert_eq!(ini.section(Some("cache")).unwrap().get("memory_size"), Some("256MB"));
        assert!(ini.section(Some("params")).is_none());
    }

    #[test]
    fn test_params_written_when_present() {
        let mut config = ConfigFile::default();
        config
            .layer
            .params
            .insert("accessToken".to_string(), "tok".to_string());

        let ini = Ini::load_from_str(&to_config_string(&config)).unwrap();
        assert_eq!(
            ini.section(Some("params")).unwrap().get("accessToken"),
            Some("tok")
        );
    }
}

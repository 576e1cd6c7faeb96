//! Offline-capable tile layer.
//!
//! A [`TileScheme`] turns tile coordinates into remote URLs and storage keys.
//! It is pure and cheap to clone. [`OfflineTileLayer`] pairs a scheme with a
//! [`TileDatabase`] and resolves tiles to either a cached local image or the
//! live remote URL.
//!
//! # Keys and subdomains
//!
//! Remote URLs rotate through the configured subdomains so requests spread
//! across servers. Storage keys always use the first subdomain, so a tile has
//! exactly one key:
//!
//! ```
//! use tilevault::coord::TileCoord;
//! use tilevault::layer::{DisplayProfile, LayerOptions, TileScheme, TileSource};
//!
//! let scheme = TileScheme::new(
//!     "https://{s}.tile/{z}/{x}/{y}.png",
//!     LayerOptions::default(),
//!     DisplayProfile::default(),
//! )
//! .unwrap();
//! let tile = TileCoord::new(1, 2, 3).unwrap();
//!
//! assert_eq!(scheme.tile_url(&tile).unwrap(), "https://a.tile/3/1/2.png");
//! assert_eq!(scheme.storage_key(&tile).unwrap().as_str(), "https://a.tile/3/1/2.png");
//! ```

mod key;
mod object_url;
mod options;

pub use key::StorageKey;
pub use object_url::{ObjectUrlRegistry, OBJECT_URL_PREFIX};
pub use options::{
    parse_subdomains, DisplayProfile, LayerOptions, DEFAULT_LAYER_MAX_ZOOM, DEFAULT_SUBDOMAINS,
    DEFAULT_TILE_SIZE,
};

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

use crate::coord::{self, CoordError, TileCoord, MAX_ZOOM};
use crate::store::TileDatabase;
use crate::template::{TemplateError, TileVars, UrlTemplate};

/// Suffix substituted for `{r}` when retina tiles are in use.
pub const RETINA_SUFFIX: &str = "@2x";

/// Errors raised by tile layers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayerError {
    /// The URL template could not be parsed
    #[error("Invalid URL template: {0}")]
    Template(#[from] TemplateError),

    /// Layer options are inconsistent
    #[error("Invalid layer configuration: {0}")]
    Config(String),

    /// The zoom level is not supported
    #[error(transparent)]
    Coord(#[from] CoordError),

    /// Tile indices fall outside the layer's grid
    #[error("Tile {x}/{y} is outside the {grid}x{grid} tile grid at zoom {z}")]
    OutOfGrid { x: u32, y: u32, z: u8, grid: u64 },
}

/// Maps tile coordinates to remote URLs and storage keys.
pub trait TileSource: Send + Sync {
    /// Tile edge length in pixels, after any retina adjustment.
    fn tile_size(&self) -> u32;

    /// Remote URL using the round-robin subdomain for this tile.
    fn tile_url(&self, coord: &TileCoord) -> Result<String, LayerError>;

    /// Remote URL using the first configured subdomain.
    fn canonical_url(&self, coord: &TileCoord) -> Result<String, LayerError>;

    /// Key under which the tile is persisted.
    fn storage_key(&self, coord: &TileCoord) -> Result<StorageKey, LayerError> {
        self.canonical_url(coord).map(StorageKey::new)
    }
}

/// A parsed URL template plus the options that shape its URLs.
#[derive(Debug, Clone)]
pub struct TileScheme {
    template: UrlTemplate,
    options: LayerOptions,
    retina: bool,
}

impl TileScheme {
    /// Builds a scheme, applying the retina adjustment for `display`.
    pub fn new(
        url: &str,
        options: LayerOptions,
        display: DisplayProfile,
    ) -> Result<Self, LayerError> {
        let mut options = options;
        let retina = options.apply_retina(display);
        options.validate()?;

        let template = UrlTemplate::with_params(url, &options.params)?;
        if template.uses_subdomain() && options.subdomains.is_empty() {
            return Err(LayerError::Config(
                "template uses {s} but no subdomains are configured".to_string(),
            ));
        }

        Ok(Self {
            template,
            options,
            retina,
        })
    }

    pub fn template(&self) -> &UrlTemplate {
        &self.template
    }

    /// Options after the retina adjustment.
    pub fn options(&self) -> &LayerOptions {
        &self.options
    }

    pub fn is_retina(&self) -> bool {
        self.retina
    }

    /// Number of tiles along one axis of this layer's grid at `zoom`.
    pub fn grid_size(&self, zoom: u8) -> u64 {
        (coord::world_size(zoom) / self.options.tile_size as f64).ceil() as u64
    }

    /// Zoom level written into URLs for a tile at `zoom`.
    pub fn zoom_for_url(&self, zoom: u8) -> i64 {
        let zoom = if self.options.zoom_reverse {
            self.options.max_zoom as i64 - zoom as i64
        } else {
            zoom as i64
        };
        zoom + self.options.zoom_offset as i64
    }

    fn check(&self, coord: &TileCoord) -> Result<u64, LayerError> {
        if coord.z > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(coord.z).into());
        }
        let grid = self.grid_size(coord.z);
        if coord.x as u64 >= grid || coord.y as u64 >= grid {
            return Err(LayerError::OutOfGrid {
                x: coord.x,
                y: coord.y,
                z: coord.z,
                grid,
            });
        }
        Ok(grid)
    }

    fn round_robin_subdomain(&self, coord: &TileCoord) -> &str {
        let subdomains = &self.options.subdomains;
        if subdomains.is_empty() {
            return "";
        }
        let index = (coord.x as u64 + coord.y as u64) % subdomains.len() as u64;
        &subdomains[index as usize]
    }

    fn canonical_subdomain(&self) -> &str {
        self.options
            .subdomains
            .first()
            .map(String::as_str)
            .unwrap_or("")
    }

    fn render(&self, coord: &TileCoord, subdomain: &str) -> Result<String, LayerError> {
        let grid = self.check(coord)?;
        let vars = TileVars {
            x: coord.x,
            y: coord.y,
            inverted_y: grid - 1 - coord.y as u64,
            zoom: self.zoom_for_url(coord.z),
            subdomain,
            retina: if self.retina { RETINA_SUFFIX } else { "" },
        };
        Ok(self.template.render(&vars))
    }
}

impl TileSource for TileScheme {
    fn tile_size(&self) -> u32 {
        self.options.tile_size
    }

    fn tile_url(&self, coord: &TileCoord) -> Result<String, LayerError> {
        self.render(coord, self.round_robin_subdomain(coord))
    }

    fn canonical_url(&self, coord: &TileCoord) -> Result<String, LayerError> {
        self.render(coord, self.canonical_subdomain())
    }
}

/// A resolved tile image reference.
#[derive(Debug, Clone, PartialEq)]
pub enum TileImage {
    /// Served from the local cache through an object URL.
    Local {
        url: String,
        key: StorageKey,
        size: usize,
    },
    /// Not cached; the renderer fetches the remote URL itself.
    Remote { url: String },
}

impl TileImage {
    /// URL to hand to the image loader.
    pub fn url(&self) -> &str {
        match self {
            Self::Local { url, .. } | Self::Remote { url } => url,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Local { .. })
    }
}

/// Tile layer that prefers cached tiles over the network.
pub struct OfflineTileLayer {
    scheme: TileScheme,
    db: Arc<dyn TileDatabase>,
    object_urls: ObjectUrlRegistry,
}

impl OfflineTileLayer {
    /// Creates a layer for `url` backed by `db`.
    pub fn new(
        url: &str,
        db: Arc<dyn TileDatabase>,
        options: LayerOptions,
        display: DisplayProfile,
    ) -> Result<Self, LayerError> {
        Ok(Self::from_scheme(TileScheme::new(url, options, display)?, db))
    }

    pub fn from_scheme(scheme: TileScheme, db: Arc<dyn TileDatabase>) -> Self {
        Self {
            scheme,
            db,
            object_urls: ObjectUrlRegistry::new(),
        }
    }

    pub fn scheme(&self) -> &TileScheme {
        &self.scheme
    }

    pub fn options(&self) -> &LayerOptions {
        self.scheme.options()
    }

    pub fn is_retina(&self) -> bool {
        self.scheme.is_retina()
    }

    pub fn database(&self) -> &Arc<dyn TileDatabase> {
        &self.db
    }

    pub fn object_urls(&self) -> &ObjectUrlRegistry {
        &self.object_urls
    }

    /// Resolves a tile to a cached object URL or its live remote URL.
    ///
    /// Storage errors never fail resolution: they are logged and the tile is
    /// treated as not cached.
    pub async fn resolve(&self, coord: &TileCoord) -> Result<TileImage, LayerError> {
        let live_url = self.scheme.tile_url(coord)?;
        let key = self.scheme.storage_key(coord)?;

        match self.db.get_item(key.as_str()).await {
            Ok(Some(data)) if !data.is_empty() => {
                let size = data.len();
                let url = self.object_urls.create(Bytes::from(data));
                debug!(tile = %coord, key = %key, size, "Tile served from cache");
                Ok(TileImage::Local { url, key, size })
            }
            Ok(_) => {
                debug!(tile = %coord, key = %key, "Tile not cached");
                Ok(TileImage::Remote { url: live_url })
            }
            Err(e) => {
                warn!(tile = %coord, key = %key, error = %e, "Cache lookup failed, using network");
                Ok(TileImage::Remote { url: live_url })
            }
        }
    }

    /// Releases the object URL of an unloaded tile.
    ///
    /// Remote URLs are ignored. Returns true if a local URL was revoked.
    pub fn release_tile(&self, url: &str) -> bool {
        ObjectUrlRegistry::is_object_url(url) && self.object_urls.revoke(url)
    }
}

impl TileSource for OfflineTileLayer {
    fn tile_size(&self) -> u32 {
        self.scheme.tile_size()
    }

    fn tile_url(&self, coord: &TileCoord) -> Result<String, LayerError> {
        self.scheme.tile_url(coord)
    }

    fn canonical_url(&self, coord: &TileCoord) -> Result<String, LayerError> {
        self.scheme.canonical_url(coord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DbError, SaveReport};
    use crate::planner::TileUrl;
    use crate::store::BoxFuture;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const OSM: &str = "https://{s}.tile/{z}/{x}/{y}.png";

    #[derive(Default)]
    struct FakeDb {
        items: HashMap<String, Vec<u8>>,
        fail: bool,
        lookups: AtomicUsize,
    }

    impl TileDatabase for FakeDb {
        fn get_item(&self, key: &str) -> BoxFuture<'_, Result<Option<Vec<u8>>, DbError>> {
            let key = key.to_string();
            Box::pin(async move {
                self.lookups.fetch_add(1, Ordering::SeqCst);
                if self.fail {
                    return Err(DbError::Storage("disk unplugged".to_string()));
                }
                Ok(self.items.get(&key).cloned())
            })
        }

        fn save_tiles<'a>(
            &'a self,
            tiles: &'a [TileUrl],
        ) -> BoxFuture<'a, Result<SaveReport, DbError>> {
            Box::pin(async move {
                Ok(SaveReport {
                    requested: tiles.len(),
                    saved: 0,
                    bytes: 0,
                })
            })
        }

        fn clear(&self) -> BoxFuture<'_, Result<(), DbError>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn scheme(options: LayerOptions) -> TileScheme {
        TileScheme::new(OSM, options, DisplayProfile::default()).unwrap()
    }

    fn tile(x: u32, y: u32, z: u8) -> TileCoord {
        TileCoord { x, y, z }
    }

    #[test]
    fn test_canonical_url_uses_first_subdomain() {
        let scheme = scheme(LayerOptions::default());
        assert_eq!(
            scheme.canonical_url(&tile(1, 2, 3)).unwrap(),
            "https://a.tile/3/1/2.png"
        );
        assert_eq!(
            scheme.storage_key(&tile(1, 2, 3)).unwrap().as_str(),
            "https://a.tile/3/1/2.png"
        );
    }

    #[test]
    fn test_tile_url_rotates_subdomains() {
        let scheme = scheme(LayerOptions::default());
        assert_eq!(scheme.tile_url(&tile(0, 0, 3)).unwrap(), "https://a.tile/3/0/0.png");
        assert_eq!(scheme.tile_url(&tile(1, 0, 3)).unwrap(), "https://b.tile/3/1/0.png");
        assert_eq!(scheme.tile_url(&tile(1, 1, 3)).unwrap(), "https://c.tile/3/1/1.png");
        assert_eq!(scheme.tile_url(&tile(2, 1, 3)).unwrap(), "https://a.tile/3/2/1.png");
    }

    #[test]
    fn test_key_is_independent_of_round_robin() {
        let scheme = scheme(LayerOptions::default());
        let a = scheme.storage_key(&tile(1, 0, 3)).unwrap();
        let b = scheme.storage_key(&tile(1, 0, 3)).unwrap();
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("https://a."));
    }

    #[test]
    fn test_zoom_offset_and_reverse() {
        let mut options = LayerOptions::default().with_zoom_reverse(true);
        options.zoom_offset = 2;
        let scheme = scheme(options);
        // max_zoom 18, reversed: 18 - 3 + 2
        assert_eq!(scheme.zoom_for_url(3), 17);
        assert_eq!(scheme.canonical_url(&tile(0, 0, 3)).unwrap(), "https://a.tile/17/0/0.png");
    }

    #[test]
    fn test_tms_rows_use_layer_grid() {
        let scheme = TileScheme::new(
            "https://t/{z}/{x}/{-y}.png",
            LayerOptions::default(),
            DisplayProfile::default(),
        )
        .unwrap();
        assert_eq!(scheme.tile_url(&tile(0, 0, 2)).unwrap(), "https://t/2/0/3.png");
    }

    #[test]
    fn test_retina_scheme() {
        let scheme = TileScheme::new(
            "https://{s}.t/{z}/{x}/{y}{r}.png",
            LayerOptions::default().with_detect_retina(true),
            DisplayProfile::retina(),
        )
        .unwrap();
        assert!(scheme.is_retina());
        assert_eq!(scheme.tile_size(), 128);
        assert_eq!(scheme.grid_size(3), 16);
        // Retina grids are twice as wide as the standard grid.
        assert_eq!(
            scheme.canonical_url(&tile(15, 0, 3)).unwrap(),
            "https://a.t/4/15/0@2x.png"
        );
    }

    #[test]
    fn test_out_of_grid_is_rejected() {
        let scheme = scheme(LayerOptions::default());
        assert!(matches!(
            scheme.tile_url(&tile(8, 0, 3)),
            Err(LayerError::OutOfGrid { grid: 8, .. })
        ));
        assert!(matches!(
            scheme.tile_url(&tile(0, 0, 31)),
            Err(LayerError::Coord(CoordError::InvalidZoom(31)))
        ));
    }

    #[test]
    fn test_configuration_errors() {
        let display = DisplayProfile::default();
        assert!(matches!(
            TileScheme::new("", LayerOptions::default(), display),
            Err(LayerError::Template(TemplateError::Empty))
        ));
        assert!(matches!(
            TileScheme::new(OSM, LayerOptions::default().with_subdomains(""), display),
            Err(LayerError::Config(_))
        ));
        assert!(matches!(
            TileScheme::new(OSM, LayerOptions::default().with_zoom_range(5, 2), display),
            Err(LayerError::Config(_))
        ));
        // No {s} in the template: an empty subdomain list is fine.
        assert!(TileScheme::new(
            "https://t/{z}/{x}/{y}.png",
            LayerOptions::default().with_subdomains(""),
            display
        )
        .is_ok());
    }

    #[tokio::test]
    async fn test_resolve_hit_returns_object_url() {
        let key = "https://a.tile/3/1/0.png".to_string();
        let mut db = FakeDb::default();
        db.items.insert(key.clone(), b"png-bytes".to_vec());
        let layer =
            OfflineTileLayer::new(OSM, Arc::new(db), LayerOptions::default(), DisplayProfile::default())
                .unwrap();

        let image = layer.resolve(&tile(1, 0, 3)).await.unwrap();
        assert!(image.is_cached());
        assert!(ObjectUrlRegistry::is_object_url(image.url()));
        assert_eq!(
            layer.object_urls().resolve(image.url()),
            Some(Bytes::from_static(b"png-bytes"))
        );
        match &image {
            TileImage::Local { key: k, size, .. } => {
                assert_eq!(k.as_str(), key);
                assert_eq!(*size, 9);
            }
            other => panic!("expected local tile, got {:?}", other),
        }

        assert!(layer.release_tile(image.url()));
        assert!(layer.object_urls().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_miss_returns_live_url() {
        let layer = OfflineTileLayer::new(
            OSM,
            Arc::new(FakeDb::default()),
            LayerOptions::default(),
            DisplayProfile::default(),
        )
        .unwrap();

        let image = layer.resolve(&tile(1, 0, 3)).await.unwrap();
        assert_eq!(
            image,
            TileImage::Remote {
                url: "https://b.tile/3/1/0.png".to_string()
            }
        );
        assert!(!layer.release_tile(image.url()));
    }

    #[tokio::test]
    async fn test_resolve_empty_payload_is_a_miss() {
        let mut db = FakeDb::default();
        db.items.insert("https://a.tile/3/0/0.png".to_string(), Vec::new());
        let layer =
            OfflineTileLayer::new(OSM, Arc::new(db), LayerOptions::default(), DisplayProfile::default())
                .unwrap();

        let image = layer.resolve(&tile(0, 0, 3)).await.unwrap();
        assert!(!image.is_cached());
    }

    #[tokio::test]
    async fn test_resolve_fails_open_on_storage_error() {
        let db = Arc::new(FakeDb {
            fail: true,
            ..Default::default()
        });
        let layer = OfflineTileLayer::new(
            OSM,
            db.clone(),
            LayerOptions::default(),
            DisplayProfile::default(),
        )
        .unwrap();

        let image = layer.resolve(&tile(0, 0, 3)).await.unwrap();
        assert_eq!(image.url(), "https://a.tile/3/0/0.png");
        assert_eq!(db.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_rejects_out_of_grid_without_lookup() {
        let db = Arc::new(FakeDb::default());
        let layer = OfflineTileLayer::new(
            OSM,
            db.clone(),
            LayerOptions::default(),
            DisplayProfile::default(),
        )
        .unwrap();

        assert!(layer.resolve(&tile(99, 0, 3)).await.is_err());
        assert_eq!(db.lookups.load(Ordering::SeqCst), 0);
    }
}

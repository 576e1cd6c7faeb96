//! Tile database: the persistence collaborator of the offline layer.
//!
//! [`TileDatabase`] is what the layer and the control talk to. [`TileDb`]
//! implements it on top of any [`Cache`] backend and an
//! [`AsyncHttpClient`] used for bulk downloads.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::planner::TileUrl;
use crate::store::http::{AsyncHttpClient, HttpError};
use crate::store::traits::{BoxFuture, Cache, CacheError};

/// Default number of tiles downloaded at once during a bulk save.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Errors raised by tile database operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DbError {
    /// The storage backend failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// A tile could not be downloaded
    #[error("Download failed for {url}: {reason}")]
    Download { url: String, reason: String },

    /// Some tiles of a bulk save failed
    #[error("Saved {saved} of {total} tiles, {failed} failed (first error: {first_error})")]
    Incomplete {
        saved: usize,
        failed: usize,
        total: usize,
        first_error: String,
    },
}

impl From<CacheError> for DbError {
    fn from(e: CacheError) -> Self {
        DbError::Storage(e.to_string())
    }
}

/// Summary of a successful bulk save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Tiles in the plan.
    pub requested: usize,
    /// Tiles downloaded and stored.
    pub saved: usize,
    /// Payload bytes stored.
    pub bytes: u64,
}

/// Persistence operations used by the offline layer and control.
pub trait TileDatabase: Send + Sync {
    /// Looks up a stored tile payload.
    fn get_item(&self, key: &str) -> BoxFuture<'_, Result<Option<Vec<u8>>, DbError>>;

    /// Downloads and stores every tile of a plan.
    fn save_tiles<'a>(&'a self, tiles: &'a [TileUrl])
        -> BoxFuture<'a, Result<SaveReport, DbError>>;

    /// Removes every stored tile.
    fn clear(&self) -> BoxFuture<'_, Result<(), DbError>>;
}

/// [`TileDatabase`] over a cache backend and an HTTP client.
///
/// Bulk saves and clears are serialized: a second save waits for the first
/// to finish rather than interleaving with it.
pub struct TileDb<C: AsyncHttpClient> {
    cache: Arc<dyn Cache>,
    client: C,
    concurrency: usize,
    bulk_lock: Mutex<()>,
}

impl<C: AsyncHttpClient> TileDb<C> {
    pub fn new(cache: Arc<dyn Cache>, client: C) -> Self {
        Self {
            cache,
            client,
            concurrency: DEFAULT_CONCURRENCY,
            bulk_lock: Mutex::new(()),
        }
    }

    /// Sets how many tiles are downloaded at once. Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    async fn save_one(&self, tile: &TileUrl) -> Result<u64, DbError> {
        let data = self
            .client
            .get(&tile.url)
            .await
            .map_err(|e: HttpError| DbError::Download {
                url: tile.url.clone(),
                reason: e.to_string(),
            })?;

        if data.is_empty() {
            return Err(DbError::Download {
                url: tile.url.clone(),
                reason: "empty response body".to_string(),
            });
        }

        let size = data.len() as u64;
        self.cache.set(tile.key.as_str(), data).await?;
        debug!(key = %tile.key, bytes = size, "Tile stored");
        Ok(size)
    }
}

impl<C: AsyncHttpClient> TileDatabase for TileDb<C> {
    fn get_item(&self, key: &str) -> BoxFuture<'_, Result<Option<Vec<u8>>, DbError>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.cache.get(&key).await?) })
    }

    fn save_tiles<'a>(
        &'a self,
        tiles: &'a [TileUrl],
    ) -> BoxFuture<'a, Result<SaveReport, DbError>> {
        Box::pin(async move {
            let _guard = self.bulk_lock.lock().await;
            let total = tiles.len();
            info!(tiles = total, concurrency = self.concurrency, "Bulk save started");

            let results: Vec<Result<u64, DbError>> = stream::iter(tiles.iter().cloned())
                .map(|tile| async move { self.save_one(&tile).await })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

            let mut saved = 0usize;
            let mut bytes = 0u64;
            let mut failed = 0usize;
            let mut first_error = None;

            for result in results {
                match result {
                    Ok(size) => {
                        saved += 1;
                        bytes += size;
                    }
                    Err(e) => {
                        warn!(error = %e, "Tile save failed");
                        failed += 1;
                        first_error.get_or_insert_with(|| e.to_string());
                    }
                }
            }

            if let Some(first_error) = first_error {
                warn!(saved, failed, total, "Bulk save incomplete");
                return Err(DbError::Incomplete {
                    saved,
                    failed,
                    total,
                    first_error,
                });
            }

            info!(saved, bytes, "Bulk save finished");
            Ok(SaveReport {
                requested: total,
                saved,
                bytes,
            })
        })
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), DbError>> {
        Box::pin(async move {
            let _guard = self.bulk_lock.lock().await;
            self.cache.clear().await?;
            info!(backend = self.cache.name(), "Tile store cleared");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::TileCoord;
    use crate::layer::{DisplayProfile, LayerOptions, TileScheme, TileSource};
    use crate::store::http::mock::MockHttpClient;
    use crate::store::MemoryCache;

    fn plan_for(coords: &[(u32, u32)]) -> Vec<TileUrl> {
        let scheme = TileScheme::new(
            "https://{s}.tile/{z}/{x}/{y}.png",
            LayerOptions::default(),
            DisplayProfile::default(),
        )
        .unwrap();
        coords
            .iter()
            .map(|&(x, y)| {
                let tile = TileCoord { x, y, z: 4 };
                TileUrl {
                    key: scheme.storage_key(&tile).unwrap(),
                    url: scheme.tile_url(&tile).unwrap(),
                }
            })
            .collect()
    }

    fn db(client: MockHttpClient) -> TileDb<MockHttpClient> {
        TileDb::new(Arc::new(MemoryCache::new(1_000_000)), client)
    }

    #[tokio::test]
    async fn test_save_tiles_stores_under_canonical_keys() {
        let db = db(MockHttpClient::serving(b"tile"));
        let plan = plan_for(&[(0, 0), (1, 0), (1, 1)]);

        let report = db.save_tiles(&plan).await.unwrap();
        assert_eq!(
            report,
            SaveReport {
                requested: 3,
                saved: 3,
                bytes: 12
            }
        );

        // Downloaded from rotating subdomains, stored under the first one.
        let requested = db.client.requests.lock().unwrap().clone();
        assert!(requested.contains(&"https://b.tile/4/1/0.png".to_string()));
        assert_eq!(
            db.get_item("https://a.tile/4/1/0.png").await.unwrap(),
            Some(b"tile".to_vec())
        );
    }

    #[tokio::test]
    async fn test_save_tiles_attempts_every_tile_on_failure() {
        let client = MockHttpClient::serving(b"tile").failing_on("https://b.tile/4/1/0.png");
        let db = db(client);
        let plan = plan_for(&[(0, 0), (1, 0), (1, 1)]);

        let err = db.save_tiles(&plan).await.unwrap_err();
        match err {
            DbError::Incomplete {
                saved,
                failed,
                total,
                first_error,
            } => {
                assert_eq!((saved, failed, total), (2, 1, 3));
                assert!(first_error.contains("https://b.tile/4/1/0.png"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(db.client.calls(), 3);
        assert!(db.get_item("https://a.tile/4/1/1.png").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_empty_download_is_a_failure() {
        let db = db(MockHttpClient::serving(b""));
        let plan = plan_for(&[(0, 0)]);

        assert!(matches!(
            db.save_tiles(&plan).await,
            Err(DbError::Incomplete { saved: 0, .. })
        ));
        assert!(db.get_item("https://a.tile/4/0/0.png").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_plan_succeeds() {
        let db = db(MockHttpClient::serving(b"tile"));
        let report = db.save_tiles(&[]).await.unwrap();
        assert_eq!(report, SaveReport::default());
        assert_eq!(db.client.calls(), 0);
    }

    #[tokio::test]
    async fn test_clear_removes_tiles() {
        let db = db(MockHttpClient::serving(b"tile"));
        db.save_tiles(&plan_for(&[(0, 0)])).await.unwrap();

        db.clear().await.unwrap();
        assert!(db.get_item("https://a.tile/4/0/0.png").await.unwrap().is_none());
    }

    #[test]
    fn test_concurrency_floor() {
        let db = db(MockHttpClient::default()).with_concurrency(0);
        assert_eq!(db.concurrency(), 1);
    }
}

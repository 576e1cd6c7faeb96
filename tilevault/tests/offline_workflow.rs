//! Integration tests for the offline workflow.
//!
//! These tests run the complete flow over a real disk cache:
//! - plan a viewport → save it → tiles resolve locally
//! - saved tiles survive reopening the cache
//! - remove → tiles resolve to the network again
//! - partial failures and the minimum zoom policy
//!
//! Run with: `cargo test --test offline_workflow`

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;

use tilevault::control::{ControlError, ControlOptions, OfflineControl, RemoveOutcome, SaveOutcome};
use tilevault::coord::{to_tile_coords, LatLngBounds, TileCoord};
use tilevault::events::OfflineEvent;
use tilevault::layer::{DisplayProfile, LayerOptions, OfflineTileLayer, TileImage, TileSource};
use tilevault::planner::Viewport;
use tilevault::store::{AsyncHttpClient, DbError, DiskCache, HttpError, TileDatabase, TileDb};

// ============================================================================
// Helper Functions
// ============================================================================

const TEMPLATE: &str = "https://{s}.tiles.test/{z}/{x}/{y}.png";

/// Serves `tile:<url>` for every URL except the failing ones.
#[derive(Default)]
struct FakeTileServer {
    failing: HashSet<String>,
    requests: Arc<AtomicUsize>,
}

impl FakeTileServer {
    fn failing_on(urls: &[String]) -> Self {
        Self {
            failing: urls.iter().cloned().collect(),
            ..Default::default()
        }
    }
}

impl AsyncHttpClient for FakeTileServer {
    async fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(url) {
            return Err(HttpError::Status {
                status: 503,
                url: url.to_string(),
            });
        }
        Ok(format!("tile:{}", url).into_bytes())
    }
}

struct Fixture {
    control: OfflineControl,
    requests: Arc<AtomicUsize>,
}

impl Fixture {
    async fn open(dir: &Path, server: FakeTileServer) -> Self {
        let requests = Arc::clone(&server.requests);
        let cache = DiskCache::open(dir).await.unwrap();
        let db = TileDb::new(Arc::new(cache), server).with_concurrency(4);
        let layer = OfflineTileLayer::new(
            TEMPLATE,
            Arc::new(db),
            LayerOptions::default(),
            DisplayProfile::default(),
        )
        .unwrap();
        let control = OfflineControl::new(
            Arc::new(layer),
            ControlOptions {
                min_zoom: 10,
                max_zoom: 11,
            },
        );
        Self { control, requests }
    }

    fn layer(&self) -> &OfflineTileLayer {
        self.control.layer()
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

/// Central London.
fn london(zoom: u8) -> Viewport {
    Viewport::new(
        LatLngBounds::from_edges(51.52, -0.14, 51.49, -0.09).unwrap(),
        zoom,
    )
}

/// A tile inside the London viewport.
fn london_tile(zoom: u8) -> TileCoord {
    to_tile_coords(51.505, -0.115, zoom).unwrap()
}

fn event_names(rx: &mut Receiver<OfflineEvent>) -> Vec<&'static str> {
    let mut names = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => names.push(event.name()),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => return names,
        }
    }
}

// ============================================================================
// Integration Tests
// ============================================================================

#[tokio::test]
async fn test_saved_area_resolves_from_disk() {
    let temp_dir = tempfile::tempdir().unwrap();
    let fixture = Fixture::open(temp_dir.path(), FakeTileServer::default()).await;
    let mut rx = fixture.control.events().subscribe();

    let planned = fixture.control.plan(&london(10)).unwrap();
    assert!(!planned.is_empty());

    let SaveOutcome::Saved(report) = fixture.control.save_area(&london(10)).await.unwrap() else {
        panic!("save was declined");
    };
    assert_eq!(report.saved, planned.len());
    assert_eq!(fixture.requests(), planned.len());
    assert_eq!(event_names(&mut rx), vec!["offline:save-start", "offline:save-end"]);

    for zoom in [10, 11] {
        let tile = london_tile(zoom);
        let image = fixture.layer().resolve(&tile).await.unwrap();
        let TileImage::Local { url, size, .. } = image else {
            panic!("tile {} was not served locally", tile);
        };

        let expected = format!("tile:{}", fixture.layer().tile_url(&tile).unwrap());
        let bytes = fixture.layer().object_urls().resolve(&url).unwrap();
        assert_eq!(bytes.as_ref(), expected.as_bytes());
        assert_eq!(size, expected.len());
        assert!(fixture.layer().release_tile(&url));
    }
}

#[tokio::test]
async fn test_saved_tiles_survive_reopen() {
    let temp_dir = tempfile::tempdir().unwrap();
    {
        let fixture = Fixture::open(temp_dir.path(), FakeTileServer::default()).await;
        fixture.control.save_area(&london(11)).await.unwrap();
    }

    let reopened = Fixture::open(temp_dir.path(), FakeTileServer::default()).await;
    let image = reopened.layer().resolve(&london_tile(11)).await.unwrap();
    assert!(image.is_cached());
    assert_eq!(reopened.requests(), 0);
}

#[tokio::test]
async fn test_remove_all_restores_network_urls() {
    let temp_dir = tempfile::tempdir().unwrap();
    let fixture = Fixture::open(temp_dir.path(), FakeTileServer::default()).await;
    fixture.control.save_area(&london(10)).await.unwrap();

    let mut rx = fixture.control.events().subscribe();
    assert_eq!(
        fixture.control.remove_all().await.unwrap(),
        RemoveOutcome::Removed
    );
    assert_eq!(
        event_names(&mut rx),
        vec!["offline:remove-start", "offline:remove-end"]
    );

    let tile = london_tile(10);
    let image = fixture.layer().resolve(&tile).await.unwrap();
    assert_eq!(
        image,
        TileImage::Remote {
            url: fixture.layer().tile_url(&tile).unwrap()
        }
    );
}

#[tokio::test]
async fn test_partial_failure_keeps_successful_tiles() {
    let temp_dir = tempfile::tempdir().unwrap();
    let probe_dir = tempfile::tempdir().unwrap();

    // Plan once to learn which URL to break.
    let probe = Fixture::open(probe_dir.path(), FakeTileServer::default()).await;
    let planned = probe.control.plan(&london(10)).unwrap();
    let broken = planned[0].url.clone();
    let survivor_key = planned.last().unwrap().key.clone();

    let fixture =
        Fixture::open(temp_dir.path(), FakeTileServer::failing_on(&[broken.clone()])).await;
    let mut rx = fixture.control.events().subscribe();

    let err = fixture.control.save_area(&london(10)).await.unwrap_err();
    match err {
        ControlError::Db(DbError::Incomplete {
            saved,
            failed,
            total,
            ..
        }) => {
            assert_eq!(failed, 1);
            assert_eq!(saved, planned.len() - 1);
            assert_eq!(total, planned.len());
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(event_names(&mut rx), vec!["offline:save-start", "offline:save-error"]);

    let stored = fixture
        .layer()
        .database()
        .get_item(survivor_key.as_str())
        .await
        .unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_below_min_zoom_makes_no_requests() {
    let temp_dir = tempfile::tempdir().unwrap();
    let fixture = Fixture::open(temp_dir.path(), FakeTileServer::default()).await;
    let mut rx = fixture.control.events().subscribe();

    let err = fixture.control.save_area(&london(9)).await.unwrap_err();
    assert_eq!(
        err,
        ControlError::BelowMinZoom {
            zoom: 9,
            min_zoom: 10
        }
    );
    assert_eq!(event_names(&mut rx), vec!["offline:below-min-zoom-error"]);
    assert_eq!(fixture.requests(), 0);
}

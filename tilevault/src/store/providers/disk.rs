//! On-disk cache backend.
//!
//! # File Layout
//!
//! Each entry is one file named by the SHA-256 of its key, fanned out by the
//! first two hex digits:
//!
//! ```text
//! {cache_dir}/{hash[0..2]}/{hash}.tile
//! ```
//!
//! Writes go to a temporary file first and are renamed into place, so a
//! reader never sees a partially written tile.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::store::traits::{BoxFuture, Cache, CacheError};

/// Extension of committed tile files.
const TILE_EXTENSION: &str = "tile";

/// File-per-key tile cache rooted at a directory.
pub struct DiskCache {
    directory: PathBuf,
    size_bytes: AtomicU64,
    entry_count: AtomicU64,
    write_seq: AtomicU64,
}

impl DiskCache {
    /// Open (creating if needed) a disk cache and scan its current size.
    pub async fn open(directory: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let directory = directory.into();
        tokio::fs::create_dir_all(&directory).await?;

        let scan_dir = directory.clone();
        let (entries, bytes) = tokio::task::spawn_blocking(move || scan(&scan_dir))
            .await
            .map_err(|e| CacheError::SpawnError(e.to_string()))?;

        info!(
            dir = %directory.display(),
            entries,
            bytes,
            "Disk cache opened"
        );

        Ok(Self {
            directory,
            size_bytes: AtomicU64::new(bytes),
            entry_count: AtomicU64::new(entries),
            write_seq: AtomicU64::new(0),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path at which `key` is stored.
    pub fn key_path(&self, key: &str) -> PathBuf {
        let hash = hash_key(key);
        self.directory
            .join(&hash[..2])
            .join(format!("{}.{}", hash, TILE_EXTENSION))
    }

    fn record_removed(&self, size: u64) {
        saturating_sub(&self.size_bytes, size);
        saturating_sub(&self.entry_count, 1);
    }
}

/// Hex SHA-256 of a key.
fn hash_key(key: &str) -> String {
    Sha256::digest(key.as_bytes())
        .iter()
        .fold(String::with_capacity(64), |mut hex, byte| {
            hex.push_str(&format!("{:02x}", byte));
            hex
        })
}

fn saturating_sub(counter: &AtomicU64, amount: u64) {
    let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
        Some(current.saturating_sub(amount))
    });
}

/// True for the two-hex-digit directory names this cache creates.
fn is_fan_out_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.len() == 2 && name.chars().all(|c| c.is_ascii_hexdigit()))
}

fn is_tile_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(TILE_EXTENSION)
}

/// Counts committed tile files and their total size.
fn scan(directory: &Path) -> (u64, u64) {
    let mut entries = 0u64;
    let mut bytes = 0u64;

    let Ok(dirs) = std::fs::read_dir(directory) else {
        return (0, 0);
    };

    for dir in dirs.flatten() {
        let dir_path = dir.path();
        let is_dir = dir.file_type().is_ok_and(|kind| kind.is_dir());
        if !is_dir || !is_fan_out_name(&dir_path) {
            continue;
        }
        let Ok(files) = std::fs::read_dir(&dir_path) else {
            debug!(dir = %dir_path.display(), "Skipping unreadable cache directory");
            continue;
        };
        for file in files.flatten() {
            if !is_tile_file(&file.path()) {
                continue;
            }
            if let Ok(metadata) = file.metadata() {
                entries += 1;
                bytes += metadata.len();
            }
        }
    }

    (entries, bytes)
}

impl Cache for DiskCache {
    fn set(&self, key: &str, value: Vec<u8>) -> BoxFuture<'_, Result<(), CacheError>> {
        let path = self.key_path(key);
        let seq = self.write_seq.fetch_add(1, Ordering::Relaxed);
        Box::pin(async move {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            let temp_path = path.with_extension(format!("{}.tmp", seq));
            tokio::fs::write(&temp_path, &value).await?;

            let previous = tokio::fs::metadata(&path).await.ok().map(|m| m.len());
            if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
                let _ = tokio::fs::remove_file(&temp_path).await;
                return Err(CacheError::Io(e));
            }

            match previous {
                Some(old_size) => saturating_sub(&self.size_bytes, old_size),
                None => {
                    self.entry_count.fetch_add(1, Ordering::Relaxed);
                }
            }
            self.size_bytes
                .fetch_add(value.len() as u64, Ordering::Relaxed);
            Ok(())
        })
    }

    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<Vec<u8>>, CacheError>> {
        let path = self.key_path(key);
        Box::pin(async move {
            match tokio::fs::read(&path).await {
                Ok(data) => Ok(Some(data)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(CacheError::Io(e)),
            }
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, Result<bool, CacheError>> {
        let path = self.key_path(key);
        Box::pin(async move {
            let size = match tokio::fs::metadata(&path).await {
                Ok(metadata) => metadata.len(),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
                Err(e) => return Err(CacheError::Io(e)),
            };
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    self.record_removed(size);
                    Ok(true)
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(CacheError::Io(e)),
            }
        })
    }

    fn contains(&self, key: &str) -> BoxFuture<'_, Result<bool, CacheError>> {
        let path = self.key_path(key);
        Box::pin(async move { Ok(tokio::fs::try_exists(&path).await?) })
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), CacheError>> {
        Box::pin(async move {
            let mut dirs = tokio::fs::read_dir(&self.directory).await?;
            let mut removed = 0usize;
            while let Some(entry) = dirs.next_entry().await? {
                let path = entry.path();
                // Leave anything this cache did not create.
                if entry.file_type().await?.is_dir() && is_fan_out_name(&path) {
                    tokio::fs::remove_dir_all(&path).await?;
                    removed += 1;
                }
            }

            self.size_bytes.store(0, Ordering::Relaxed);
            self.entry_count.store(0, Ordering::Relaxed);
            info!(dir = %self.directory.display(), removed, "Disk cache cleared");
            Ok(())
        })
    }

    fn size_bytes(&self) -> u64 {
        self.size_bytes.load(Ordering::Relaxed)
    }

    fn entry_count(&self) -> u64 {
        self.entry_count.load(Ordering::Relaxed)
    }

    fn max_size_bytes(&self) -> Option<u64> {
        None
    }

    fn name(&self) -> &'static str {
        "disk"
    }
}

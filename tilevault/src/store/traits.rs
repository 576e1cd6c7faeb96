//! Key-value storage interface for tile payloads.
//!
//! The `Cache` trait is deliberately small: string keys, raw byte values and
//! a handful of bookkeeping queries. Tile semantics live one level up in
//! [`TileDb`](super::TileDb).
//!
//! The trait is dyn-compatible (`Arc<dyn Cache>`) so backends can be chosen
//! from configuration at runtime.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

/// Errors raised by cache backends.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error during cache operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value exceeds the size a backend can hold.
    #[error("Value too large: {size} bytes (max: {max})")]
    ValueTooLarge { size: usize, max: usize },

    /// Failed to run a blocking filesystem task.
    #[error("Failed to spawn task: {0}")]
    SpawnError(String),

    /// Backend-specific error.
    #[error("Provider error: {0}")]
    Provider(String),
}

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Key-value storage for tile payloads.
///
/// All implementations must be `Send + Sync` for use across async tasks.
pub trait Cache: Send + Sync {
    /// Store a value, replacing any previous value for the key.
    fn set(&self, key: &str, value: Vec<u8>) -> BoxFuture<'_, Result<(), CacheError>>;

    /// Retrieve a value.
    ///
    /// Returns `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<Vec<u8>>, CacheError>>;

    /// Delete a value. Returns `Ok(false)` if the key did not exist.
    fn delete(&self, key: &str) -> BoxFuture<'_, Result<bool, CacheError>>;

    /// Check if a key exists without reading the value.
    fn contains(&self, key: &str) -> BoxFuture<'_, Result<bool, CacheError>>;

    /// Remove every entry.
    fn clear(&self) -> BoxFuture<'_, Result<(), CacheError>>;

    /// Current size of all stored values in bytes.
    fn size_bytes(&self) -> u64;

    /// Current number of entries.
    fn entry_count(&self) -> u64;

    /// Configured size limit in bytes, or `None` when unbounded.
    fn max_size_bytes(&self) -> Option<u64>;

    /// Short backend name for logs and stats.
    fn name(&self) -> &'static str;
}

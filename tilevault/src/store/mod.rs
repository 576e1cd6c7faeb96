//! Tile persistence.
//!
//! - [`Cache`]: byte-level key-value backends ([`MemoryCache`], [`DiskCache`])
//! - [`TileDatabase`]: the get / bulk save / clear contract used by the layer
//! - [`TileDb`]: `TileDatabase` over a `Cache` plus an [`AsyncHttpClient`]

mod db;
pub mod http;
mod providers;
mod traits;

pub use db::{DbError, SaveReport, TileDatabase, TileDb, DEFAULT_CONCURRENCY};
pub use http::{AsyncHttpClient, AsyncReqwestClient, HttpError};
pub use providers::{DiskCache, MemoryCache};
pub use traits::{BoxFuture, Cache, CacheError};

//! Cache backends.
//!
//! - [`MemoryCache`]: moka-backed, size-bounded, process lifetime
//! - [`DiskCache`]: one file per tile, survives restarts

mod disk;
mod memory;

pub use disk::DiskCache;
pub use memory::MemoryCache;

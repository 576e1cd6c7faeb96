//! Transient object URLs for cached tile payloads.
//!
//! A cache hit hands the renderer a `blob:tilevault/<n>` URL instead of the
//! bytes themselves. The renderer resolves the URL when it draws the tile and
//! the layer revokes it when the tile unloads.

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use dashmap::DashMap;

/// Scheme prefix for every URL issued by the registry.
pub const OBJECT_URL_PREFIX: &str = "blob:tilevault/";

/// Concurrent registry of live object URLs.
#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    entries: DashMap<String, Bytes>,
    next_id: AtomicU64,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a payload and returns a fresh URL for it.
    pub fn create(&self, data: Bytes) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let url = format!("{}{}", OBJECT_URL_PREFIX, id);
        self.entries.insert(url.clone(), data);
        url
    }

    /// Returns the payload behind a live URL.
    pub fn resolve(&self, url: &str) -> Option<Bytes> {
        self.entries.get(url).map(|entry| entry.value().clone())
    }

    /// Releases a URL. Returns false if it was not live.
    pub fn revoke(&self, url: &str) -> bool {
        self.entries.remove(url).is_some()
    }

    /// Returns true if `url` was issued by this kind of registry.
    pub fn is_object_url(url: &str) -> bool {
        url.starts_with(OBJECT_URL_PREFIX)
    }

    /// Number of live URLs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_resolve_revoke() {
        let registry = ObjectUrlRegistry::new();
        let url = registry.create(Bytes::from_static(b"png"));

        assert!(ObjectUrlRegistry::is_object_url(&url));
        assert_eq!(registry.resolve(&url), Some(Bytes::from_static(b"png")));
        assert_eq!(registry.len(), 1);

        assert!(registry.revoke(&url));
        assert!(registry.resolve(&url).is_none());
        assert!(!registry.revoke(&url));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_urls_are_unique() {
        let registry = ObjectUrlRegistry::new();
        let a = registry.create(Bytes::from_static(b"same"));
        let b = registry.create(Bytes::from_static(b"same"));
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_remote_urls_are_not_object_urls() {
        assert!(!ObjectUrlRegistry::is_object_url("https://a.tile/1/0/0.png"));
    }
}

//! In-memory cache backend using moka.
//!
//! Entries are weighted by payload size and evicted when the total exceeds
//! the configured limit. Contents are lost when the process exits.

use moka::future::Cache as MokaCache;

use crate::store::traits::{BoxFuture, Cache, CacheError};

/// Size-bounded in-memory tile cache.
pub struct MemoryCache {
    cache: MokaCache<String, Vec<u8>>,
    max_size_bytes: u64,
}

impl MemoryCache {
    /// Create a memory cache holding at most `max_size_bytes` of payload.
    pub fn new(max_size_bytes: u64) -> Self {
        let cache = MokaCache::builder()
            // moka weights are u32; oversized values are rejected in `set`
            .weigher(|_key: &String, value: &Vec<u8>| -> u32 {
                value.len().min(u32::MAX as usize) as u32
            })
            .max_capacity(max_size_bytes)
            .build();

        Self {
            cache,
            max_size_bytes,
        }
    }

    /// Flush moka's pending maintenance so counters are exact.
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}

impl Cache for MemoryCache {
    fn set(&self, key: &str, value: Vec<u8>) -> BoxFuture<'_, Result<(), CacheError>> {
        let key = key.to_string();
        Box::pin(async move {
            if value.len() > u32::MAX as usize {
                return Err(CacheError::ValueTooLarge {
                    size: value.len(),
                    max: u32::MAX as usize,
                });
            }
            self.cache.insert(key, value).await;
            Ok(())
        })
    }

    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<Vec<u8>>, CacheError>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.cache.get(&key).await) })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, Result<bool, CacheError>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.cache.remove(&key).await.is_some()) })
    }

    fn contains(&self, key: &str) -> BoxFuture<'_, Result<bool, CacheError>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.cache.contains_key(&key)) })
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), CacheError>> {
        Box::pin(async move {
            self.cache.invalidate_all();
            self.cache.run_pending_tasks().await;
            Ok(())
        })
    }

    fn size_bytes(&self) -> u64 {
        self.cache.weighted_size()
    }

    fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    fn max_size_bytes(&self) -> Option<u64> {
        Some(self.max_size_bytes)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_cache_new() {
        let cache = MemoryCache::new(1_000_000);
        assert_eq!(cache.max_size_bytes(), Some(1_000_000));
        assert_eq!(cache.entry_count(), 0);
        assert_eq!(cache.size_bytes(), 0);
    }

    #[tokio::test]
    async fn test_memory_cache_set_and_get() {
        let cache = MemoryCache::new(1_000_000);

        cache.set("key1", vec![1, 2, 3]).await.unwrap();

        assert_eq!(cache.get("key1").await.unwrap(), Some(vec![1, 2, 3]));
        assert!(cache.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_cache_delete() {
        let cache = MemoryCache::new(1_000_000);

        cache.set("key1", vec![1, 2, 3]).await.unwrap();
        assert!(cache.contains("key1").await.unwrap());

        assert!(cache.delete("key1").await.unwrap());
        assert!(!cache.contains("key1").await.unwrap());
        assert!(!cache.delete("key1").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_cache_counters() {
        let cache = MemoryCache::new(1_000_000);

        cache.set("a", vec![0; 100]).await.unwrap();
        cache.set("b", vec![0; 50]).await.unwrap();
        cache.run_pending_tasks().await;

        assert_eq!(cache.entry_count(), 2);
        assert_eq!(cache.size_bytes(), 150);
    }

    #[tokio::test]
    async fn test_memory_cache_clear() {
        let cache = MemoryCache::new(1_000_000);

        cache.set("a", vec![1]).await.unwrap();
        cache.set("b", vec![2]).await.unwrap();
        cache.clear().await.unwrap();

        assert!(cache.get("a").await.unwrap().is_none());
        assert_eq!(cache.entry_count(), 0);
    }
}

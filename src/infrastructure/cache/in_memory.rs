//! In-memory cache implementation using moka

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use moka::future::Cache as MokaCache;

use crate::domain::cache::Cache;
use crate::domain::DomainError;

const MIB: u64 = 1024 * 1024;

/// Configuration for in-memory cache
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Hard ceiling on the summed size of keys and values, in bytes
    pub max_memory_bytes: u64,
    /// Time an entry stays readable after it was last written
    pub life_window: Duration,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_memory_bytes: 10 * MIB,
            life_window: Duration::from_secs(30),
        }
    }
}

impl InMemoryCacheConfig {
    /// Sets the memory ceiling in mebibytes
    pub fn with_max_memory_mb(mut self, mb: u64) -> Self {
        self.max_memory_bytes = mb.saturating_mul(MIB);
        self
    }

    /// Sets the memory ceiling in bytes
    pub fn with_max_memory_bytes(mut self, bytes: u64) -> Self {
        self.max_memory_bytes = bytes;
        self
    }

    /// Sets the entry time-to-live
    pub fn with_life_window(mut self, ttl: Duration) -> Self {
        self.life_window = ttl;
        self
    }
}

/// Thread-safe in-memory cache implementation using moka
///
/// Entries are weighed by key plus value length so the configured ceiling is
/// a byte budget rather than an entry count. moka shards internally and
/// evicts on its own schedule once the budget is exceeded.
#[derive(Debug, Clone)]
pub struct InMemoryCache {
    cache: MokaCache<String, Bytes>,
    config: InMemoryCacheConfig,
}

impl InMemoryCache {
    /// Creates a new in-memory cache with default configuration
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    /// Creates a new in-memory cache with the given configuration
    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.max_memory_bytes)
            .weigher(|key: &String, value: &Bytes| -> u32 {
                u32::try_from(key.len() + value.len()).unwrap_or(u32::MAX)
            })
            .time_to_live(config.life_window)
            .build();

        Self { cache, config }
    }

    pub fn config(&self) -> &InMemoryCacheConfig {
        &self.config
    }

    /// Summed weight of live entries after pending maintenance has run
    pub async fn weighted_size(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.weighted_size()
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, DomainError> {
        Ok(self.cache.get(key).await)
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<(), DomainError> {
        self.cache.insert(key.to_string(), value).await;
        Ok(())
    }

    async fn evict(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.cache.remove(key).await.is_some())
    }

    async fn evict_all(&self) -> Result<(), DomainError> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }

    async fn size(&self) -> Result<usize, DomainError> {
        self.cache.run_pending_tasks().await;
        Ok(self.cache.entry_count() as usize)
    }
}

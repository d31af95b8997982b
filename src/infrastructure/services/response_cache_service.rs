//! Read-through caching of serialized sequence responses

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::cache::{Cache, CacheKey};
use crate::domain::DomainError;

/// Outcome of a read-through lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedBody {
    pub body: Bytes,
    pub hit: bool,
}

/// Cache-aside policy in front of the sequence repositories
///
/// The cache is never the system of record: every failure talking to it is
/// logged and swallowed so that a broken cache only costs performance.
#[derive(Debug, Clone)]
pub struct ResponseCacheService {
    cache: Arc<dyn Cache>,
}

impl ResponseCacheService {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }

    /// Returns the cached body for `key`, treating cache errors as a miss
    pub async fn lookup(&self, key: &CacheKey) -> Option<Bytes> {
        let key = key.to_string();

        match self.cache.get(&key).await {
            Ok(Some(body)) => {
                debug!(key = %key, "Cache hit");
                Some(body)
            }
            Ok(None) => {
                debug!(key = %key, "Cache miss");
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache lookup failed");
                None
            }
        }
    }

    /// Serves `key` from the cache, or runs `fetch`, serializes its result
    /// and stores it under `key`
    ///
    /// Errors from `fetch` are returned untouched and nothing is cached.
    pub async fn read_through<T, F, Fut>(
        &self,
        key: CacheKey,
        fetch: F,
    ) -> Result<CachedBody, DomainError>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        if let Some(body) = self.lookup(&key).await {
            return Ok(CachedBody { body, hit: true });
        }

        let value = fetch().await?;
        let body = serde_json::to_vec(&value)
            .map(Bytes::from)
            .map_err(|e| DomainError::internal(format!("Failed to serialize response: {}", e)))?;

        self.populate(&key, body.clone()).await;

        Ok(CachedBody { body, hit: false })
    }

    /// Drops the cached detail view of one sequence
    pub async fn invalidate_sequence(&self, id: &Uuid) {
        let key = CacheKey::sequence(*id).to_string();

        match self.cache.evict(&key).await {
            Ok(evicted) => debug!(key = %key, evicted, "Invalidated cached sequence"),
            Err(e) => warn!(key = %key, error = %e, "Cache eviction failed"),
        }
    }

    /// Drops every cached page and sequence
    pub async fn invalidate_all(&self) {
        match self.cache.evict_all().await {
            Ok(()) => debug!("Invalidated all cached responses"),
            Err(e) => warn!(error = %e, "Cache flush failed"),
        }
    }

    async fn populate(&self, key: &CacheKey, body: Bytes) {
        let key = key.to_string();

        if let Err(e) = self.cache.set(&key, body).await {
            warn!(key = %key, error = %e, "Cache population failed");
        }
    }
}

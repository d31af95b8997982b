//! Cache trait definition

use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::DomainError;

/// Byte-keyed, byte-valued cache with per-entry expiry
///
/// Values are opaque to the cache. Entries may disappear at any time
/// (expiry, capacity eviction), so callers must treat a hit as optional.
#[async_trait]
pub trait Cache: Send + Sync + Debug {
    /// Gets a value, `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<Bytes>, DomainError>;

    /// Stores a value, replacing any previous entry and restarting its expiry
    async fn set(&self, key: &str, value: Bytes) -> Result<(), DomainError>;

    /// Removes one entry; returns whether it was present
    async fn evict(&self, key: &str) -> Result<bool, DomainError>;

    /// Removes every entry
    async fn evict_all(&self) -> Result<(), DomainError>;

    /// Approximate number of live entries
    async fn size(&self) -> Result<usize, DomainError>;
}

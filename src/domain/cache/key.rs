//! Cache key derivation for sequence reads
//!
//! Keys are plain strings so that they stay readable in logs:
//! `sequences-{size}-{page}` for list pages and `sequence-{id}` for a single
//! sequence. Both families share no prefix that could make them collide.

use std::fmt;

use uuid::Uuid;

const PAGE_PREFIX: &str = "sequences";
const DETAIL_PREFIX: &str = "sequence";

/// Key of a cached read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A list page, keyed by the effective (already clamped) page size
    Page { size: u32, page: u32 },
    /// A single sequence, keyed by its external identifier
    Sequence(Uuid),
}

impl CacheKey {
    pub fn page(size: u32, page: u32) -> Self {
        Self::Page { size, page }
    }

    pub fn sequence(id: Uuid) -> Self {
        Self::Sequence(id)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page { size, page } => write!(f, "{}-{}-{}", PAGE_PREFIX, size, page),
            Self::Sequence(id) => write!(f, "{}-{}", DETAIL_PREFIX, id.hyphenated()),
        }
    }
}

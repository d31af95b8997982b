//! Cache domain - byte-valued cache abstraction and key derivation

mod key;
mod repository;

pub use key::CacheKey;
pub use repository::Cache;

#[cfg(test)]
pub use repository::mock::MockCache;

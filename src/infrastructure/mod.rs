//! Infrastructure layer - storage, cache and service implementations

pub mod cache;
pub mod logging;
pub mod sequence;
pub mod services;
pub mod storage;

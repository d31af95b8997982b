//! Sequence API
//!
//! HTTP service for mail sequences (named, ordered collections of mail steps)
//! backed by PostgreSQL, with an in-process read-through cache in front of
//! the read endpoints.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use infrastructure::{
    cache::InMemoryCache,
    sequence::{InMemorySequenceRepository, PostgresSequenceRepository, PostgresStepRepository},
    storage::{connect_pool, run_storage_migrations},
};
use tracing::info;

/// Create the application state backed by PostgreSQL
///
/// Connects the pool, applies pending migrations when enabled and builds the
/// cache from configuration.
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    info!("Connecting to PostgreSQL...");
    let pool = connect_pool(&config.database.to_postgres_config()).await?;

    if config.database.run_migrations {
        let applied = run_storage_migrations(&pool).await?;
        info!(applied, "Storage migrations up to date");
    }

    let cache = InMemoryCache::with_config(config.cache.to_cache_config());
    info!(
        max_memory_bytes = cache.config().max_memory_bytes,
        life_window_secs = cache.config().life_window.as_secs(),
        "Response cache ready"
    );

    Ok(AppState::new(
        Arc::new(PostgresSequenceRepository::new(pool.clone())),
        Arc::new(PostgresStepRepository::new(pool)),
        Arc::new(cache),
        config.pagination,
    ))
}

/// Create the application state over in-memory storage
///
/// Returns the repository and cache handles as well so callers can inspect
/// or fault them.
pub fn create_in_memory_app_state(
    config: &AppConfig,
) -> (AppState, InMemorySequenceRepository, InMemoryCache) {
    let repository = InMemorySequenceRepository::new();
    let cache = InMemoryCache::with_config(config.cache.to_cache_config());

    let state = AppState::new(
        Arc::new(repository.clone()),
        Arc::new(repository.clone()),
        Arc::new(cache.clone()),
        config.pagination,
    );

    (state, repository, cache)
}

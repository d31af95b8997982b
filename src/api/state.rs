//! Application state for shared services

use std::sync::Arc;

use crate::config::PaginationConfig;
use crate::domain::cache::Cache;
use crate::domain::sequence::{SequenceRepository, StepRepository};
use crate::infrastructure::sequence::{SequenceService, StepService};
use crate::infrastructure::services::ResponseCacheService;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub sequence_service: Arc<SequenceService>,
    pub step_service: Arc<StepService>,
    pub response_cache: ResponseCacheService,
    pub pagination: PaginationConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("pagination", &self.pagination)
            .finish()
    }
}

impl AppState {
    /// Wire services over the given repositories and cache
    ///
    /// The same cache instance backs the read path and both services, so a
    /// write invalidates exactly what the handlers populated.
    pub fn new(
        sequences: Arc<dyn SequenceRepository>,
        steps: Arc<dyn StepRepository>,
        cache: Arc<dyn Cache>,
        pagination: PaginationConfig,
    ) -> Self {
        let response_cache = ResponseCacheService::new(cache);

        Self {
            sequence_service: Arc::new(SequenceService::new(
                sequences.clone(),
                response_cache.clone(),
            )),
            step_service: Arc::new(StepService::new(sequences, steps, response_cache.clone())),
            response_cache,
            pagination,
        }
    }
}

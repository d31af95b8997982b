//! Sequence infrastructure module
//!
//! PostgreSQL repositories for the sequence aggregate, an in-memory
//! repository with the same semantics for tests, and the services that put
//! the cache in front of them.

mod in_memory;
mod postgres_repository;
mod service;

pub use in_memory::InMemorySequenceRepository;
pub use postgres_repository::{PostgresSequenceRepository, PostgresStepRepository};
pub use service::{
    CreateSequenceRequest, CreateStepRequest, SequenceService, StepService,
    UpdateSequenceRequest, UpdateStepRequest,
};

//! Domain layer - Core business logic and entities

pub mod cache;
pub mod error;
pub mod sequence;

pub use cache::{Cache, CacheKey};
pub use error::DomainError;
pub use sequence::{
    Sequence, SequenceRepository, SequenceValidationError, Step, StepRepository,
};

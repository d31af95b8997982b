//! Sequence and step repository traits

use async_trait::async_trait;
use uuid::Uuid;

use super::entity::{Sequence, Step};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Repository for the sequence aggregate
///
/// Lookups report a missing row as `DomainError::NotFound`; every other
/// failure is `DomainError::Storage`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SequenceRepository: Send + Sync {
    /// Inserts the sequence and all of its steps atomically
    ///
    /// Returns the aggregate with storage identities, external identifiers
    /// and the creation timestamp filled in. Nothing is written if any insert
    /// fails.
    async fn create(&self, sequence: Sequence) -> Result<Sequence, DomainError>;

    /// Loads one sequence with its steps
    async fn find_by_external_id(&self, id: &Uuid) -> Result<Sequence, DomainError>;

    /// Loads a page of sequences in creation order
    async fn find_all(&self, limit: u32, offset: u64) -> Result<Vec<Sequence>, DomainError>;

    /// Persists the tracking flags and stamps `updated_at`
    ///
    /// Steps are not touched. Fails with `NotFound` when the row is gone.
    async fn update(&self, sequence: Sequence) -> Result<Sequence, DomainError>;

    /// Removes a sequence; its steps go with it through the foreign key
    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError>;

    /// Cheap round trip used by the health endpoint
    async fn ping(&self) -> Result<(), DomainError>;
}

/// Repository for single-step operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StepRepository: Send + Sync {
    /// Finds a step addressed through its parent sequence
    ///
    /// Fails with `NotFound` unless the step exists and belongs to the
    /// given sequence.
    async fn find_one(&self, sequence_id: &Uuid, step_id: &Uuid) -> Result<Step, DomainError>;

    /// Appends a step to an existing sequence (`step.sequence_id` must be set)
    async fn create(&self, step: Step) -> Result<Step, DomainError>;

    /// Persists subject, content and order of an existing step
    async fn update(&self, step: Step) -> Result<Step, DomainError>;

    /// Removes a step by its external identifier
    async fn delete(&self, step_id: &Uuid) -> Result<bool, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_sequence_repository_not_found() {
        let mut mock = MockSequenceRepository::new();
        mock.expect_find_by_external_id()
            .returning(|id| Err(DomainError::not_found(format!("Sequence '{}' not found", id))));

        let result = mock.find_by_external_id(&Uuid::new_v4()).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_mock_step_repository_delete() {
        let mut mock = MockStepRepository::new();
        mock.expect_delete().returning(|_| Ok(true));

        assert!(mock.delete(&Uuid::new_v4()).await.unwrap());
    }
}

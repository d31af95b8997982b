//! Sequence and step services
//!
//! Writes go to the repositories first; cached responses are invalidated only
//! once the write has succeeded.

use std::sync::Arc;

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::domain::sequence::{
    validate_mail_content, validate_mail_subject, validate_sequence_name, validate_step_orders,
    Sequence, SequenceRepository, SequenceValidationError, Step, StepRepository,
};
use crate::domain::DomainError;
use crate::infrastructure::services::ResponseCacheService;

/// Request for creating a step, alone or as part of a new sequence
#[derive(Debug, Clone)]
pub struct CreateStepRequest {
    pub mail_subject: String,
    pub mail_content: String,
    pub order: Option<i32>,
}

/// Request for creating a sequence with its steps
#[derive(Debug, Clone)]
pub struct CreateSequenceRequest {
    pub name: String,
    pub open_tracking_enabled: bool,
    pub click_tracking_enabled: bool,
    pub steps: Vec<CreateStepRequest>,
}

/// Request for updating the tracking flags of a sequence
#[derive(Debug, Clone, Default)]
pub struct UpdateSequenceRequest {
    pub open_tracking_enabled: Option<bool>,
    pub click_tracking_enabled: Option<bool>,
}

/// Request for updating a single step
#[derive(Debug, Clone, Default)]
pub struct UpdateStepRequest {
    pub mail_subject: Option<String>,
    pub mail_content: Option<String>,
    pub order: Option<i32>,
}

fn validation_error(error: SequenceValidationError) -> DomainError {
    DomainError::validation(error.to_string())
}

/// Logs storage-side failures before they travel up to the handler
fn log_failure(operation: &'static str, error: DomainError) -> DomainError {
    match &error {
        DomainError::NotFound { .. } | DomainError::Validation { .. } => {
            debug!(operation, error = %error, "Request rejected");
        }
        _ => error!(operation, error = %error, "Sequence storage operation failed"),
    }
    error
}

/// Service for the sequence aggregate
pub struct SequenceService {
    repository: Arc<dyn SequenceRepository>,
    cache: ResponseCacheService,
}

impl std::fmt::Debug for SequenceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceService").finish()
    }
}

impl SequenceService {
    pub fn new(repository: Arc<dyn SequenceRepository>, cache: ResponseCacheService) -> Self {
        Self { repository, cache }
    }

    /// Create a sequence and all of its steps in one unit
    pub async fn create(&self, request: CreateSequenceRequest) -> Result<Sequence, DomainError> {
        validate_sequence_name(&request.name).map_err(validation_error)?;

        let mut steps = Vec::with_capacity(request.steps.len());

        for (position, step) in request.steps.into_iter().enumerate() {
            validate_mail_subject(&step.mail_subject).map_err(validation_error)?;
            validate_mail_content(&step.mail_content).map_err(validation_error)?;

            let order = step
                .order
                .unwrap_or_else(|| i32::try_from(position + 1).unwrap_or(i32::MAX));
            steps.push(Step::new(step.mail_subject, step.mail_content, order));
        }

        let orders: Vec<i32> = steps.iter().map(|s| s.order).collect();
        validate_step_orders(&orders).map_err(validation_error)?;

        info!(name = %request.name, steps = steps.len(), "Creating sequence");

        let sequence = Sequence::new(
            request.name.trim(),
            request.open_tracking_enabled,
            request.click_tracking_enabled,
            steps,
        );

        let created = self
            .repository
            .create(sequence)
            .await
            .map_err(|e| log_failure("create_sequence", e))?;

        self.cache.invalidate_all().await;
        Ok(created)
    }

    /// Get a sequence with its steps
    pub async fn get(&self, id: &Uuid) -> Result<Sequence, DomainError> {
        self.repository
            .find_by_external_id(id)
            .await
            .map_err(|e| log_failure("get_sequence", e))
    }

    /// List one page of sequences in creation order
    pub async fn list(&self, size: u32, page: u32) -> Result<Vec<Sequence>, DomainError> {
        let offset = u64::from(size) * u64::from(page);

        self.repository
            .find_all(size, offset)
            .await
            .map_err(|e| log_failure("list_sequences", e))
    }

    /// Update the tracking flags of a sequence
    pub async fn update(
        &self,
        id: &Uuid,
        request: UpdateSequenceRequest,
    ) -> Result<Sequence, DomainError> {
        let mut sequence = self.get(id).await?;

        if let Some(enabled) = request.open_tracking_enabled {
            sequence.open_tracking_enabled = enabled;
        }

        if let Some(enabled) = request.click_tracking_enabled {
            sequence.click_tracking_enabled = enabled;
        }

        let updated = self
            .repository
            .update(sequence)
            .await
            .map_err(|e| log_failure("update_sequence", e))?;

        info!(id = %id, "Updated sequence");
        self.cache.invalidate_all().await;
        Ok(updated)
    }

    /// Delete a sequence together with its steps
    pub async fn delete(&self, id: &Uuid) -> Result<(), DomainError> {
        let deleted = self
            .repository
            .delete(id)
            .await
            .map_err(|e| log_failure("delete_sequence", e))?;

        if !deleted {
            return Err(DomainError::not_found(format!("Sequence '{}' not found", id)));
        }

        info!(id = %id, "Deleted sequence");
        self.cache.invalidate_all().await;
        Ok(())
    }

    /// Whether the database answers
    pub async fn is_database_healthy(&self) -> bool {
        match self.repository.ping().await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Database health check failed");
                false
            }
        }
    }
}

/// Service for single-step mutations
pub struct StepService {
    sequences: Arc<dyn SequenceRepository>,
    steps: Arc<dyn StepRepository>,
    cache: ResponseCacheService,
}

impl std::fmt::Debug for StepService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepService").finish()
    }
}

impl StepService {
    pub fn new(
        sequences: Arc<dyn SequenceRepository>,
        steps: Arc<dyn StepRepository>,
        cache: ResponseCacheService,
    ) -> Self {
        Self {
            sequences,
            steps,
            cache,
        }
    }

    /// Append a step to an existing sequence
    ///
    /// Without an explicit order the step goes after the current last step.
    pub async fn create(
        &self,
        sequence_id: &Uuid,
        request: CreateStepRequest,
    ) -> Result<Step, DomainError> {
        validate_mail_subject(&request.mail_subject).map_err(validation_error)?;
        validate_mail_content(&request.mail_content).map_err(validation_error)?;

        let parent = self
            .sequences
            .find_by_external_id(sequence_id)
            .await
            .map_err(|e| log_failure("create_step", e))?;

        let order = request.order.unwrap_or_else(|| parent.next_step_order());

        if order < 1 {
            return Err(validation_error(SequenceValidationError::InvalidOrder(order)));
        }

        if parent.steps.iter().any(|s| s.order == order) {
            return Err(validation_error(SequenceValidationError::DuplicateOrder(order)));
        }

        let step = Step::new(request.mail_subject, request.mail_content, order)
            .with_sequence_id(parent.id);

        let created = self
            .steps
            .create(step)
            .await
            .map_err(|e| log_failure("create_step", e))?;

        info!(sequence_id = %sequence_id, step_id = %created.external_id, "Created step");
        self.cache.invalidate_sequence(sequence_id).await;
        Ok(created)
    }

    /// Update subject, content or order of a step
    pub async fn update(
        &self,
        sequence_id: &Uuid,
        step_id: &Uuid,
        request: UpdateStepRequest,
    ) -> Result<Step, DomainError> {
        if let Some(subject) = &request.mail_subject {
            validate_mail_subject(subject).map_err(validation_error)?;
        }

        if let Some(content) = &request.mail_content {
            validate_mail_content(content).map_err(validation_error)?;
        }

        if let Some(order) = request.order.filter(|order| *order < 1) {
            return Err(validation_error(SequenceValidationError::InvalidOrder(order)));
        }

        let mut step = self
            .steps
            .find_one(sequence_id, step_id)
            .await
            .map_err(|e| log_failure("update_step", e))?;

        if let Some(subject) = request.mail_subject {
            step.mail_subject = subject;
        }

        if let Some(content) = request.mail_content {
            step.mail_content = content;
        }

        if let Some(order) = request.order {
            step.order = order;
        }

        let updated = self
            .steps
            .update(step)
            .await
            .map_err(|e| log_failure("update_step", e))?;

        info!(sequence_id = %sequence_id, step_id = %step_id, "Updated step");
        self.cache.invalidate_sequence(sequence_id).await;
        Ok(updated)
    }

    /// Delete a step addressed through its parent sequence
    ///
    /// Returns false, and leaves the cache alone, when the pair does not resolve.
    pub async fn delete(&self, sequence_id: &Uuid, step_id: &Uuid) -> Result<bool, DomainError> {
        match self.steps.find_one(sequence_id, step_id).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                debug!(sequence_id = %sequence_id, step_id = %step_id, "Step already absent");
                return Ok(false);
            }
            Err(e) => return Err(log_failure("delete_step", e)),
        }

        let deleted = self
            .steps
            .delete(step_id)
            .await
            .map_err(|e| log_failure("delete_step", e))?;

        if deleted {
            info!(sequence_id = %sequence_id, step_id = %step_id, "Deleted step");
            self.cache.invalidate_sequence(sequence_id).await;
        }

        Ok(deleted)
    }
}

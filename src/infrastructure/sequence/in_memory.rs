//! In-memory sequence repository

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::sequence::{Sequence, SequenceRepository, Step, StepRepository};
use crate::domain::DomainError;

/// Rows laid out the way the relational schema keeps them: sequences
/// without steps, and steps pointing at their parent by storage identity.
#[derive(Debug, Default)]
struct Tables {
    last_sequence_id: i64,
    last_step_id: i64,
    sequences: Vec<Sequence>,
    steps: Vec<Step>,
}

impl Tables {
    fn assemble(&self, row: &Sequence) -> Sequence {
        let mut sequence = row.clone();
        sequence.steps = self
            .steps
            .iter()
            .filter(|s| s.sequence_id == row.id)
            .cloned()
            .collect();
        sequence.sort_steps();
        sequence
    }
}

/// In-memory implementation of both sequence and step repositories
///
/// Clones share the same tables. Failures can be injected to exercise the
/// error paths that a database would produce.
#[derive(Debug, Clone, Default)]
pub struct InMemorySequenceRepository {
    tables: Arc<RwLock<Tables>>,
    unavailable: Arc<AtomicBool>,
    fail_step_insert_at: Arc<Mutex<Option<usize>>>,
}

impl InMemorySequenceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with a storage error
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make the `index`-th step insert of the next aggregate creation fail
    pub fn fail_step_insert_at(&self, index: usize) {
        if let Ok(mut guard) = self.fail_step_insert_at.lock() {
            *guard = Some(index);
        }
    }

    pub async fn sequence_count(&self) -> usize {
        self.tables.read().await.sequences.len()
    }

    pub async fn step_count(&self) -> usize {
        self.tables.read().await.steps.len()
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::storage("Database unavailable"));
        }
        Ok(())
    }

    fn take_step_failure(&self) -> Option<usize> {
        self.fail_step_insert_at
            .lock()
            .ok()
            .and_then(|mut guard| guard.take())
    }
}

#[async_trait]
impl SequenceRepository for InMemorySequenceRepository {
    async fn create(&self, mut sequence: Sequence) -> Result<Sequence, DomainError> {
        self.check_available()?;
        let fail_at = self.take_step_failure();
        let mut tables = self.tables.write().await;

        // Stage every row first; the tables are only touched once all inserts
        // have succeeded.
        let sequence_id = tables.last_sequence_id + 1;
        let mut step_id = tables.last_step_id;

        sequence.id = sequence_id;
        sequence.external_id = Uuid::new_v4();
        sequence.created_at = Utc::now();
        sequence.updated_at = None;

        for (index, step) in sequence.steps.iter_mut().enumerate() {
            if fail_at == Some(index) {
                return Err(DomainError::storage("Failed to create step: injected failure"));
            }

            step_id += 1;
            step.id = step_id;
            step.external_id = Uuid::new_v4();
            step.sequence_id = sequence_id;
        }

        tables.last_sequence_id = sequence_id;
        tables.last_step_id = step_id;
        tables.steps.extend(sequence.steps.iter().cloned());

        let mut row = sequence.clone();
        row.steps.clear();
        tables.sequences.push(row);

        sequence.sort_steps();
        Ok(sequence)
    }

    async fn find_by_external_id(&self, id: &Uuid) -> Result<Sequence, DomainError> {
        self.check_available()?;
        let tables = self.tables.read().await;

        tables
            .sequences
            .iter()
            .find(|s| s.external_id == *id)
            .map(|row| tables.assemble(row))
            .ok_or_else(|| DomainError::not_found(format!("Sequence '{}' not found", id)))
    }

    async fn find_all(&self, limit: u32, offset: u64) -> Result<Vec<Sequence>, DomainError> {
        self.check_available()?;
        let tables = self.tables.read().await;

        let mut rows: Vec<&Sequence> = tables.sequences.iter().collect();
        rows.sort_by_key(|s| (s.created_at, s.id));

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);

        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .map(|row| tables.assemble(row))
            .collect())
    }

    async fn update(&self, mut sequence: Sequence) -> Result<Sequence, DomainError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;

        let row = tables
            .sequences
            .iter_mut()
            .find(|s| s.id == sequence.id)
            .ok_or_else(|| {
                DomainError::not_found(format!("Sequence '{}' not found", sequence.external_id))
            })?;

        let now = Utc::now();
        row.open_tracking_enabled = sequence.open_tracking_enabled;
        row.click_tracking_enabled = sequence.click_tracking_enabled;
        row.updated_at = Some(now);

        sequence.updated_at = Some(now);
        Ok(sequence)
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, DomainError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;

        let Some(position) = tables.sequences.iter().position(|s| s.external_id == *id) else {
            return Ok(false);
        };

        let removed = tables.sequences.remove(position);
        tables.steps.retain(|s| s.sequence_id != removed.id);
        Ok(true)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        self.check_available()
    }
}

#[async_trait]
impl StepRepository for InMemorySequenceRepository {
    async fn find_one(&self, sequence_id: &Uuid, step_id: &Uuid) -> Result<Step, DomainError> {
        self.check_available()?;
        let tables = self.tables.read().await;

        let parent = tables
            .sequences
            .iter()
            .find(|s| s.external_id == *sequence_id)
            .map(|s| s.id);

        parent
            .and_then(|parent_id| {
                tables
                    .steps
                    .iter()
                    .find(|s| s.external_id == *step_id && s.sequence_id == parent_id)
            })
            .cloned()
            .ok_or_else(|| {
                DomainError::not_found(format!(
                    "Step '{}' not found in sequence '{}'",
                    step_id, sequence_id
                ))
            })
    }

    async fn create(&self, mut step: Step) -> Result<Step, DomainError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;

        if !tables.sequences.iter().any(|s| s.id == step.sequence_id) {
            return Err(DomainError::storage(format!(
                "Failed to create step: sequence {} does not exist",
                step.sequence_id
            )));
        }

        tables.last_step_id += 1;
        step.id = tables.last_step_id;
        step.external_id = Uuid::new_v4();
        tables.steps.push(step.clone());

        Ok(step)
    }

    async fn update(&self, step: Step) -> Result<Step, DomainError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;

        let row = tables
            .steps
            .iter_mut()
            .find(|s| s.external_id == step.external_id)
            .ok_or_else(|| {
                DomainError::not_found(format!("Step '{}' not found", step.external_id))
            })?;

        row.mail_subject = step.mail_subject.clone();
        row.mail_content = step.mail_content.clone();
        row.order = step.order;

        Ok(step)
    }

    async fn delete(&self, step_id: &Uuid) -> Result<bool, DomainError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;

        let before = tables.steps.len();
        tables.steps.retain(|s| s.external_id != *step_id);
        Ok(tables.steps.len() < before)
    }
}

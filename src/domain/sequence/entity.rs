//! Sequence and step entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One mail message inside a sequence
///
/// `id` and `sequence_id` are storage identities and stay `0` until the step
/// has been written. `external_id` is the client-facing identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: i64,
    pub external_id: Uuid,
    pub sequence_id: i64,
    pub mail_subject: String,
    pub mail_content: String,
    pub order: i32,
}

impl Step {
    /// Create an unsaved step
    pub fn new(mail_subject: impl Into<String>, mail_content: impl Into<String>, order: i32) -> Self {
        Self {
            id: 0,
            external_id: Uuid::nil(),
            sequence_id: 0,
            mail_subject: mail_subject.into(),
            mail_content: mail_content.into(),
            order,
        }
    }

    /// Attach the step to a persisted parent
    pub fn with_sequence_id(mut self, sequence_id: i64) -> Self {
        self.sequence_id = sequence_id;
        self
    }

    /// Whether the step has been written to storage
    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }
}

/// A sequence together with its steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub id: i64,
    pub external_id: Uuid,
    pub name: String,
    pub open_tracking_enabled: bool,
    pub click_tracking_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub steps: Vec<Step>,
}

impl Sequence {
    /// Create an unsaved sequence
    ///
    /// Identity and creation timestamp are assigned by the repository on create.
    pub fn new(
        name: impl Into<String>,
        open_tracking_enabled: bool,
        click_tracking_enabled: bool,
        steps: Vec<Step>,
    ) -> Self {
        Self {
            id: 0,
            external_id: Uuid::nil(),
            name: name.into(),
            open_tracking_enabled,
            click_tracking_enabled,
            created_at: Utc::now(),
            updated_at: None,
            steps,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }

    /// Highest order number among the steps, if any
    pub fn max_step_order(&self) -> Option<i32> {
        self.steps.iter().map(|s| s.order).max()
    }

    /// Order number for a step appended to the end of the sequence
    pub fn next_step_order(&self) -> i32 {
        self.max_step_order().map_or(1, |max| max.saturating_add(1))
    }

    /// Sort steps by order number, then by storage identity
    pub fn sort_steps(&mut self) {
        self.steps.sort_by_key(|s| (s.order, s.id));
    }
}

//! Sequence domain
//!
//! A sequence is an ordered collection of mail steps, persisted and mutated
//! as one aggregate.

mod entity;
mod repository;
mod validation;

pub use entity::{Sequence, Step};
pub use repository::{SequenceRepository, StepRepository};
pub use validation::{
    parse_external_id, validate_mail_content, validate_mail_subject, validate_sequence_name,
    validate_step_orders, SequenceValidationError,
};

#[cfg(test)]
pub use repository::{MockSequenceRepository, MockStepRepository};

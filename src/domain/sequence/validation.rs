//! Sequence validation

use std::collections::HashSet;

use thiserror::Error;
use uuid::Uuid;

use crate::domain::DomainError;

/// Errors that can occur during sequence validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SequenceValidationError {
    #[error("sequence name is required")]
    EmptyName,

    #[error("sequence name cannot exceed {0} characters")]
    NameTooLong(usize),

    #[error("sequence steps are required")]
    NoSteps,

    #[error("mail subject is required")]
    EmptySubject,

    #[error("mail content is required")]
    EmptyContent,

    #[error("step order must be greater than zero, got {0}")]
    InvalidOrder(i32),

    #[error("step order {0} is used more than once")]
    DuplicateOrder(i32),
}

const MAX_SEQUENCE_NAME_LENGTH: usize = 255;

/// Validate a sequence name
pub fn validate_sequence_name(name: &str) -> Result<(), SequenceValidationError> {
    if name.trim().is_empty() {
        return Err(SequenceValidationError::EmptyName);
    }

    if name.chars().count() > MAX_SEQUENCE_NAME_LENGTH {
        return Err(SequenceValidationError::NameTooLong(MAX_SEQUENCE_NAME_LENGTH));
    }

    Ok(())
}

pub fn validate_mail_subject(subject: &str) -> Result<(), SequenceValidationError> {
    if subject.is_empty() {
        return Err(SequenceValidationError::EmptySubject);
    }
    Ok(())
}

pub fn validate_mail_content(content: &str) -> Result<(), SequenceValidationError> {
    if content.is_empty() {
        return Err(SequenceValidationError::EmptyContent);
    }
    Ok(())
}

/// Validate the order numbers of the steps submitted with a new sequence
///
/// Orders must be positive and unique within the request. An empty slice is
/// rejected because a sequence needs at least one step at creation.
pub fn validate_step_orders(orders: &[i32]) -> Result<(), SequenceValidationError> {
    if orders.is_empty() {
        return Err(SequenceValidationError::NoSteps);
    }

    let mut seen = HashSet::with_capacity(orders.len());

    for &order in orders {
        if order < 1 {
            return Err(SequenceValidationError::InvalidOrder(order));
        }

        if !seen.insert(order) {
            return Err(SequenceValidationError::DuplicateOrder(order));
        }
    }

    Ok(())
}

/// Parse a client-supplied sequence or step identifier
pub fn parse_external_id(raw: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| DomainError::invalid_id(format!("'{}' is not a valid identifier", raw)))
}

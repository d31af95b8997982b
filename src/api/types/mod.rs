//! HTTP wire types

pub mod error;
pub mod json;
pub mod sequence;

pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
pub use sequence::{
    CreateSequenceRequest, CreateStepRequest, SequenceResponse, StepResponse,
    UpdateSequenceRequest, UpdateStepRequest,
};

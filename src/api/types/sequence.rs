//! Sequence and step wire types

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::domain::sequence::{Sequence, Step};
use crate::infrastructure::sequence::{
    CreateSequenceRequest as CreateSequenceCommand, CreateStepRequest as CreateStepCommand,
    UpdateSequenceRequest as UpdateSequenceCommand, UpdateStepRequest as UpdateStepCommand,
};

/// Body of `POST /sequences`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSequenceRequest {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(default)]
    pub open_tracking_enabled: bool,
    #[serde(default)]
    pub click_tracking_enabled: bool,
    #[serde(default)]
    pub steps: Vec<CreateStepRequest>,
}

/// A step, either inside a new sequence or appended to an existing one
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStepRequest {
    pub mail_subject: String,
    pub mail_content: String,
    #[serde(default)]
    pub order: Option<i32>,
}

/// Body of `PATCH /sequences/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSequenceRequest {
    pub open_tracking_enabled: Option<bool>,
    pub click_tracking_enabled: Option<bool>,
}

/// Body of `PATCH /sequences/{sequence_id}/steps/{step_id}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStepRequest {
    pub mail_subject: Option<String>,
    pub mail_content: Option<String>,
    pub order: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResponse {
    pub id: String,
    pub mail_subject: String,
    pub mail_content: String,
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceResponse {
    pub id: String,
    pub name: String,
    pub open_tracking_enabled: bool,
    pub click_tracking_enabled: bool,
    pub steps: Vec<StepResponse>,
    pub created_at: String,
    pub last_updated_at: Option<String>,
}

impl From<CreateStepRequest> for CreateStepCommand {
    fn from(request: CreateStepRequest) -> Self {
        Self {
            mail_subject: request.mail_subject,
            mail_content: request.mail_content,
            order: request.order,
        }
    }
}

impl From<CreateSequenceRequest> for CreateSequenceCommand {
    fn from(request: CreateSequenceRequest) -> Self {
        Self {
            name: request.name,
            open_tracking_enabled: request.open_tracking_enabled,
            click_tracking_enabled: request.click_tracking_enabled,
            steps: request.steps.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<UpdateSequenceRequest> for UpdateSequenceCommand {
    fn from(request: UpdateSequenceRequest) -> Self {
        Self {
            open_tracking_enabled: request.open_tracking_enabled,
            click_tracking_enabled: request.click_tracking_enabled,
        }
    }
}

impl From<UpdateStepRequest> for UpdateStepCommand {
    fn from(request: UpdateStepRequest) -> Self {
        Self {
            mail_subject: request.mail_subject,
            mail_content: request.mail_content,
            order: request.order,
        }
    }
}

impl From<&Step> for StepResponse {
    fn from(step: &Step) -> Self {
        Self {
            id: step.external_id.to_string(),
            mail_subject: step.mail_subject.clone(),
            mail_content: step.mail_content.clone(),
            order: step.order,
        }
    }
}

impl From<&Sequence> for SequenceResponse {
    fn from(sequence: &Sequence) -> Self {
        Self {
            id: sequence.external_id.to_string(),
            name: sequence.name.clone(),
            open_tracking_enabled: sequence.open_tracking_enabled,
            click_tracking_enabled: sequence.click_tracking_enabled,
            steps: sequence.steps.iter().map(StepResponse::from).collect(),
            created_at: sequence
                .created_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            last_updated_at: sequence
                .updated_at
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }
}

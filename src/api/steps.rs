//! Step endpoints, always addressed through the parent sequence

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;

use crate::api::sequences::parse_id;
use crate::api::state::AppState;
use crate::api::types::{ApiError, CreateStepRequest, Json, StepResponse, UpdateStepRequest};

/// POST /sequences/{sequence_id}/steps
pub async fn create_step(
    State(state): State<AppState>,
    Path(sequence_id): Path<String>,
    Json(request): Json<CreateStepRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let sequence_id = parse_id(&sequence_id)?;

    let step = state
        .step_service
        .create(&sequence_id, request.into())
        .await?;

    Ok((StatusCode::CREATED, Json(StepResponse::from(&step))))
}

/// PATCH /sequences/{sequence_id}/steps/{step_id}
pub async fn update_step(
    State(state): State<AppState>,
    Path((sequence_id, step_id)): Path<(String, String)>,
    Json(request): Json<UpdateStepRequest>,
) -> Result<Json<StepResponse>, ApiError> {
    let sequence_id = parse_id(&sequence_id)?;
    let step_id = parse_id(&step_id)?;

    let step = state
        .step_service
        .update(&sequence_id, &step_id, request.into())
        .await?;

    Ok(Json(StepResponse::from(&step)))
}

/// DELETE /sequences/{sequence_id}/steps/{step_id}
pub async fn delete_step(
    State(state): State<AppState>,
    Path((sequence_id, step_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let sequence_id = parse_id(&sequence_id)?;
    let step_id = parse_id(&step_id)?;

    let deleted = state.step_service.delete(&sequence_id, &step_id).await?;
    debug!(sequence_id = %sequence_id, step_id = %step_id, deleted, "Step delete handled");

    Ok(StatusCode::NO_CONTENT)
}

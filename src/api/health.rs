//! Health endpoint

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::api::types::Json;

use super::state::AppState;

/// Status of one component
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Ok,
    Error,
}

/// Health of the service and its database
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub app: ComponentStatus,
    pub database: ComponentStatus,
}

/// GET /health
///
/// Always answers 200; a failing database is reported in the body.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = if state.sequence_service.is_database_healthy().await {
        ComponentStatus::Ok
    } else {
        ComponentStatus::Error
    };

    Json(HealthResponse {
        app: ComponentStatus::Ok,
        database,
    })
}

//! Sequence endpoints

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::api::types::{
    ApiError, CreateSequenceRequest, Json, SequenceResponse, UpdateSequenceRequest,
};
use crate::domain::cache::CacheKey;
use crate::domain::sequence::parse_external_id;
use crate::domain::DomainError;

/// Raw list query; values are parsed leniently
#[derive(Debug, Default, Deserialize)]
pub struct ListSequencesQuery {
    pub size: Option<String>,
    pub page: Option<String>,
}

/// Responds with an already serialized JSON body
pub(crate) fn json_bytes(body: Bytes) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body,
    )
        .into_response()
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    parse_external_id(raw).map_err(|e| {
        warn!(id = %raw, "Malformed identifier");
        ApiError::from(e)
    })
}

/// POST /sequences
pub async fn create_sequence(
    State(state): State<AppState>,
    Json(request): Json<CreateSequenceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    debug!(name = %request.name, steps = request.steps.len(), "Creating sequence");

    let sequence = state.sequence_service.create(request.into()).await?;

    Ok((StatusCode::CREATED, Json(SequenceResponse::from(&sequence))))
}

/// GET /sequences?size=&page=
pub async fn list_sequences(
    State(state): State<AppState>,
    Query(query): Query<ListSequencesQuery>,
) -> Result<Response, ApiError> {
    let (size, page) = state
        .pagination
        .resolve(query.size.as_deref(), query.page.as_deref());

    let cached = state
        .response_cache
        .read_through(CacheKey::page(size, page), || async {
            let sequences = state.sequence_service.list(size, page).await?;
            Ok::<_, DomainError>(
                sequences
                    .iter()
                    .map(SequenceResponse::from)
                    .collect::<Vec<_>>(),
            )
        })
        .await?;

    debug!(size, page, hit = cached.hit, "Listed sequences");
    Ok(json_bytes(cached.body))
}

/// GET /sequences/{id}
pub async fn get_sequence(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;

    let cached = state
        .response_cache
        .read_through(CacheKey::sequence(id), || async {
            let sequence = state.sequence_service.get(&id).await?;
            Ok::<_, DomainError>(SequenceResponse::from(&sequence))
        })
        .await?;

    debug!(id = %id, hit = cached.hit, "Fetched sequence");
    Ok(json_bytes(cached.body))
}

/// PATCH /sequences/{id}
pub async fn update_sequence(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateSequenceRequest>,
) -> Result<Json<SequenceResponse>, ApiError> {
    let id = parse_id(&id)?;

    let sequence = state.sequence_service.update(&id, request.into()).await?;

    Ok(Json(SequenceResponse::from(&sequence)))
}

/// DELETE /sequences/{id}
pub async fn delete_sequence(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;

    state.sequence_service.delete(&id).await?;

    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::health;
use super::sequences;
use super::state::AppState;
use super::steps;

/// Create the router with application state
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/sequences",
            post(sequences::create_sequence).get(sequences::list_sequences),
        )
        .route(
            "/sequences/{id}",
            get(sequences::get_sequence)
                .patch(sequences::update_sequence)
                .delete(sequences::delete_sequence),
        )
        .route("/sequences/{sequence_id}/steps", post(steps::create_step))
        .route(
            "/sequences/{sequence_id}/steps/{step_id}",
            patch(steps::update_step).delete(steps::delete_step),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

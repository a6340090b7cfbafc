use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;
use common::lifecycle::LifecycleState;

/// Readiness of the persistence layer
///
/// 200 only once the database is connected and migrated. A degraded process
/// keeps answering with 503 and the recorded reason.
#[tracing::instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.lifecycle_state() {
        LifecycleState::Ready => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        LifecycleState::Degraded { reason } => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "reason": reason })),
        ),
        other => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": other.name() })),
        ),
    }
}

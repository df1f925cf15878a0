use axum::{extract::State, routing::{get, post}, Json, Router};
use std::sync::Arc;

use crate::web::models::{RunContainerRequest, RunContainerResponse};
use crate::web::{AppError, AppState};

/// POST /api/containermanager/run-container — single-flight benchmark run.
/// The response is held until the container exits and cleanup finished.
async fn run_container_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<RunContainerRequest>,
) -> Result<Json<RunContainerResponse>, AppError> {
    let project_id = payload
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Missing required field: id".to_string()))?;

    let outcome = app_state.orchestrator.run(&project_id).await?;
    Ok(Json(RunContainerResponse {
        message: outcome.message,
        results: outcome.results,
    }))
}

async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn run_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/run-container", post(run_container_handler))
        .route("/health", get(health_check_handler))
}

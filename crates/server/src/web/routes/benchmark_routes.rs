use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use benchforge_common::BenchmarkResult;
use chrono::Utc;
use std::sync::Arc;

use crate::db::store;
use crate::web::models::{BenchmarkListQuery, IngestBenchmarkRequest};
use crate::web::{AppError, AppState};

/// POST /api/benchmarks — persist one finalized result document as a new,
/// immutable record. Publishers that omit the timestamp get the server time.
async fn ingest_benchmark_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<IngestBenchmarkRequest>,
) -> Result<(StatusCode, Json<BenchmarkResult>), AppError> {
    let project_id = payload
        .project_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Missing required field: projectId".to_string()))?;

    let result = BenchmarkResult {
        id: None,
        project_id,
        runtime: payload.runtime.unwrap_or_else(|| "unknown".to_string()),
        timestamp_ms: payload
            .timestamp
            .unwrap_or_else(|| Utc::now().timestamp_millis()),
        fields: payload.fields,
        timeseries_fields: payload.timeseries_fields,
    };

    let stored = store::insert_result(&app_state.db_pool, result).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn list_benchmarks_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<BenchmarkListQuery>,
) -> Result<Json<Vec<BenchmarkResult>>, AppError> {
    let results = store::list_results(&app_state.db_pool, params.project_id.as_deref()).await?;
    Ok(Json(results))
}

async fn list_benchmarks_for_project_handler(
    State(app_state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<BenchmarkResult>>, AppError> {
    let results = store::list_results(&app_state.db_pool, Some(&project_id)).await?;
    Ok(Json(results))
}

async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn benchmark_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(list_benchmarks_handler).post(ingest_benchmark_handler),
        )
        .route("/health", get(health_check_handler))
        .route("/{project_id}", get(list_benchmarks_for_project_handler))
}

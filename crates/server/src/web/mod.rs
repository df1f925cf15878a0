use axum::{http::Method, Router};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::orchestrator::RunOrchestrator;
use crate::server::config::ServerConfig;

pub mod error;
pub mod models;
pub mod routes;

pub use error::AppError;

use routes::benchmark_routes::benchmark_router;
use routes::run_routes::run_router;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub orchestrator: Arc<RunOrchestrator>,
    pub config: Arc<ServerConfig>,
}

pub fn create_axum_router(app_state: AppState) -> Router {
    // The dashboard is served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .nest("/api/benchmarks", benchmark_router())
        .nest("/api/containermanager", run_router())
        .layer(cors)
        .with_state(Arc::new(app_state))
}

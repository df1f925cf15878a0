use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::orchestrator::state::InvalidTransition;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("A benchmark run is already in progress. Try again later.")]
    RunInProgress,
    #[error("Staging error: {0}")]
    Staging(String),
    #[error("Execution error: {0}")]
    Execution(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::RunInProgress => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            AppError::Staging(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Staging error: {msg}"),
            ),
            AppError::Execution(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Execution error: {msg}"),
            ),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {msg}"),
            ),
            AppError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({ "error": error_message }))).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<InvalidTransition> for AppError {
    fn from(err: InvalidTransition) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use secopt_core::{OptimizerError, StoreError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Resource errors
    NotFound(String),

    // Validation errors
    ValidationError(String),

    // No optimization backend
    SolverUnavailable,

    // Database errors
    DatabaseError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::SolverUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "No optimization solver available",
            ),
            AppError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error occurred")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
            StoreError::Backend(msg) => AppError::DatabaseError(msg),
        }
    }
}

impl From<OptimizerError> for AppError {
    fn from(err: OptimizerError) -> Self {
        match err {
            OptimizerError::SolverUnavailable => AppError::SolverUnavailable,
            OptimizerError::ArchitectureNotFound(_) => AppError::NotFound("Architecture not found".to_string()),
            OptimizerError::AttributeNotFound(_) => AppError::NotFound("Security attribute not found".to_string()),
            e @ OptimizerError::InvalidBudget(_) => AppError::ValidationError(e.to_string()),
            OptimizerError::Store(e) => e.into(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

//! Error types for the HTTP API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use invp_core::error::StoreError;
use invp_core::StageFailure;
use serde::Serialize;
use thiserror::Error;

/// Handler result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// A pipeline stage failed.
    #[error("{0}")]
    Stage(StageFailure),

    #[error("Database error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StageFailure> for AppError {
    fn from(failure: StageFailure) -> Self {
        AppError::Stage(failure)
    }
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    status: &'static str,
    error: String,
}

/// Stage failure response body.
#[derive(Serialize)]
struct StageFailureResponse {
    status: &'static str,
    #[serde(flatten)]
    failure: StageFailure,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Stage(failure) => {
                let status = if failure.stage.is_input_error() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                tracing::info!("Pipeline failed: {}", failure);
                let body = StageFailureResponse {
                    status: "FAIL",
                    failure,
                };
                return (status, Json(body)).into_response();
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::Store(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            AppError::Io(e) => {
                tracing::error!("IO error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        let body = ErrorResponse {
            status: "FAIL",
            error: message,
        };
        (status, Json(body)).into_response()
    }
}

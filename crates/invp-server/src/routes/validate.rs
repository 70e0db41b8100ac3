//! Standalone record validation.

use axum::{extract::State, http::StatusCode, Json};
use invp_core::ValidationResult;
use serde_json::Value;

use crate::state::AppState;

/// `POST /validate`: 200 with the report when the record passes, 422 when
/// it does not.
pub async fn validate_invoice(State(state): State<AppState>, Json(record): Json<Value>) -> (StatusCode, Json<ValidationResult>) {
    let result = state.pipeline().validator().validate(&record);

    let status = if result.is_pass() {
        StatusCode::OK
    } else {
        tracing::debug!("Validation failed with {} error(s)", result.error_count());
        StatusCode::UNPROCESSABLE_ENTITY
    };

    (status, Json(result))
}

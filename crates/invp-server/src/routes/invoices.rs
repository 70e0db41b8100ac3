//! Stored invoice endpoints: history, lookup, deletion and download.

use std::path::Path as FsPath;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use invp_core::{ExportFormat, StoredInvoice};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    invoices: Vec<StoredInvoice>,
    total: usize,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    status: &'static str,
    deleted: i64,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    format: Option<String>,
}

/// `GET /invoices/history`: newest first.
pub async fn history(State(state): State<AppState>) -> Result<Json<HistoryResponse>> {
    let invoices = state.store()?.list()?;
    let total = invoices.len();
    Ok(Json(HistoryResponse { invoices, total }))
}

/// `GET /invoices/:id`
pub async fn get_invoice(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<StoredInvoice>> {
    state
        .store()?
        .get(id)?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// `DELETE /invoices/:id`
pub async fn delete_invoice(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<DeleteResponse>> {
    if !state.store()?.delete(id)? {
        return Err(not_found(id));
    }

    tracing::info!("Deleted invoice {}", id);
    Ok(Json(DeleteResponse {
        status: "OK",
        deleted: id,
    }))
}

/// `GET /invoices/:id/download?format=csv|xlsx`: export the stored record
/// again and return the file.
pub async fn download_invoice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<DownloadQuery>,
) -> Result<impl IntoResponse> {
    let format = ExportFormat::parse(query.format.as_deref().unwrap_or("csv"))
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    if format.extension().is_none() {
        return Err(AppError::BadRequest(format!("Download is not available for {}", format)));
    }

    let store = state.store()?;
    let stored = store.get(id)?.ok_or_else(|| not_found(id))?;

    let export = state
        .pipeline()
        .exporter()
        .export(&stored.normalized, format.as_str(), Some(id))
        .await;
    let location = match (export.is_pass(), export.file) {
        (true, Some(file)) => file,
        _ => {
            return Err(AppError::Internal(
                export.error.unwrap_or_else(|| "Export failed".to_string()),
            ))
        }
    };
    store.record_export(id, format.as_str(), &location)?;

    let bytes = tokio::fs::read(&location).await?;
    let filename = FsPath::new(&location)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("invoice")
        .to_string();

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        bytes,
    ))
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Invoice {} not found", id))
}

//! Document upload endpoints running the full pipeline.

use axum::{
    extract::{Multipart, State},
    Json,
};
use invp_core::ocr::sanitize_filename;
use invp_core::{ExportResult, SourceDocument};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Successful pipeline response.
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    invoice_id: Option<i64>,
    export: ExportResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    receipt: Option<String>,
}

/// Fields of an upload form.
struct Upload {
    filename: String,
    bytes: Vec<u8>,
    export_format: Option<String>,
}

/// `POST /process_invoice`: process without persisting.
pub async fn process_invoice(State(state): State<AppState>, multipart: Multipart) -> Result<Json<ProcessResponse>> {
    run(state, multipart, false).await
}

/// `POST /invoices/upload`: process and persist.
pub async fn upload_invoice(State(state): State<AppState>, multipart: Multipart) -> Result<Json<ProcessResponse>> {
    run(state, multipart, true).await
}

async fn run(state: AppState, multipart: Multipart, persist: bool) -> Result<Json<ProcessResponse>> {
    let upload = read_upload(multipart).await?;

    let format = upload
        .export_format
        .or_else(|| state.config().export.default_format.clone())
        .unwrap_or_else(|| "csv".to_string());

    let upload_dir = &state.config().storage.upload_dir;
    tokio::fs::create_dir_all(upload_dir).await?;
    let path = upload_dir.join(&upload.filename);
    tokio::fs::write(&path, &upload.bytes).await?;
    tracing::debug!("Saved upload {} ({} bytes)", path.display(), upload.bytes.len());

    let document = SourceDocument::new(upload.filename, upload.bytes).with_path(path);
    let outcome = state.pipeline().process(&document, &format, persist).await?;

    tracing::info!(
        "Processed {} -> {}",
        document.filename,
        outcome.export.file.as_deref().unwrap_or("")
    );

    Ok(Json(ProcessResponse {
        status: "OK",
        invoice_id: outcome.invoice_id,
        export: outcome.export,
        receipt: outcome.receipt,
    }))
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut export_format = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read upload: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let filename = sanitize_filename(field.file_name().unwrap_or(""));
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file data: {}", e)))?;
                file = Some((filename, data.to_vec()));
            }
            "export_format" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read export_format: {}", e)))?;
                if !value.trim().is_empty() {
                    export_format = Some(value.trim().to_string());
                }
            }
            other => tracing::debug!("Ignoring form field '{}'", other),
        }
    }

    let (filename, bytes) = file.ok_or_else(|| AppError::BadRequest("No file provided. Use field name 'file'".to_string()))?;

    Ok(Upload {
        filename,
        bytes,
        export_format,
    })
}

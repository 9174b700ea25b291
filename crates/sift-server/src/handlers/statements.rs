//! Statement upload and read handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;

use crate::{get_owner_id, map_core_error, AppError, AppState, SuccessResponse};
use sift_core::models::{StatementDetails, StatementSummary};
use sift_core::pdf;

/// Response for a successful upload
#[derive(Serialize)]
pub struct UploadResponse {
    pub id: i64,
}

/// POST /api/statements - Upload a statement PDF (multipart)
///
/// Expects a `file` part with the PDF bytes and an optional `name` part
/// for the display name. Returns 400 for non-PDF files or empty documents,
/// 413 when the extracted text exceeds the limit, and 409 when the same
/// content was already uploaded by this owner.
pub async fn upload_statement(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let owner = get_owner_id(&headers);

    let mut file_bytes: Option<Vec<u8>> = None;
    let mut display_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::bad_request("Invalid multipart body"))?
    {
        match field.name() {
            Some("file") => {
                if display_name.is_none() {
                    display_name = field.file_name().map(|s| s.to_string());
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::bad_request("Failed to read file upload"))?;
                file_bytes = Some(bytes.to_vec());
            }
            Some("name") => {
                let name = field
                    .text()
                    .await
                    .map_err(|_| AppError::bad_request("Invalid name field"))?;
                if !name.trim().is_empty() {
                    display_name = Some(name.trim().to_string());
                }
            }
            _ => {}
        }
    }

    let file_bytes = file_bytes.ok_or_else(|| AppError::bad_request("Missing file upload"))?;

    if !pdf::is_pdf(&file_bytes) {
        return Err(AppError::bad_request("Uploaded file is not a PDF"));
    }

    let text = pdf::extract_statement_text(&file_bytes).map_err(map_core_error)?;

    let id = state
        .db
        .create_statement(&owner, display_name.as_deref(), &text)
        .map_err(map_core_error)?;

    state.db.log_audit(
        &owner,
        "upload",
        Some("statement"),
        Some(id),
        Some(&format!("chars={}", text.len())),
    )?;

    Ok((StatusCode::CREATED, Json(UploadResponse { id })))
}

/// GET /api/statements - List this owner's statements with summary metrics
pub async fn list_statements(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<StatementSummary>>, AppError> {
    let owner = get_owner_id(&headers);

    let statements = state.db.list_statements(&owner)?;

    state.db.log_audit(
        &owner,
        "list",
        Some("statement"),
        None,
        Some(&format!("count={}", statements.len())),
    )?;

    Ok(Json(statements))
}

/// GET /api/statements/:id - Full view: metrics, transactions, insights, loans
pub async fn get_statement_details(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<StatementDetails>, AppError> {
    let owner = get_owner_id(&headers);

    let details = state
        .db
        .get_statement_details(id, &owner)?
        .ok_or_else(|| AppError::not_found(&format!("Statement {} not found", id)))?;

    state
        .db
        .log_audit(&owner, "view", Some("statement"), Some(id), None)?;

    Ok(Json(details))
}

/// DELETE /api/statements/:id - Delete a statement and all derived rows
pub async fn delete_statement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, AppError> {
    let owner = get_owner_id(&headers);

    let deleted = state.db.delete_statement(id, &owner)?;
    if !deleted {
        return Err(AppError::not_found(&format!("Statement {} not found", id)));
    }

    state
        .db
        .log_audit(&owner, "delete", Some("statement"), Some(id), None)?;

    Ok(Json(SuccessResponse { success: true }))
}

//! Audit log handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{AppError, AppState};
use sift_core::db::AuditEntry;

/// Query parameters for the audit log
#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    /// Number of entries to return (default 100, max 1000)
    pub limit: Option<i64>,
}

/// GET /api/audit - Most recent audit entries
pub async fn list_audit_log(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEntry>>, AppError> {
    let limit = params.limit.unwrap_or(100).clamp(1, 1000);
    let entries = state.db.list_audit_log(limit)?;
    Ok(Json(entries))
}

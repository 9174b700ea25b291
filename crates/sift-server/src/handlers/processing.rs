//! Statement processing and extraction backend handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{get_owner_id, map_core_error, AppError, AppState};
use sift_core::ai::ExtractionBackend;
use sift_core::processor::{ProcessOutcome, StatementProcessor};
use sift_core::Error as CoreError;

/// Response for the process endpoint
#[derive(Serialize)]
pub struct ProcessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ProcessOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/statements/:id/process - Run the extraction pipeline
///
/// Returns 404 for unknown statements, 409 when the statement is not in
/// the uploaded stage, and 503 when no extraction backend is configured.
/// Pipeline failures return 500 with `success: false` and the statement
/// moves to the failed stage.
pub async fn process_statement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let owner = get_owner_id(&headers);

    let client = state
        .extractor
        .clone()
        .ok_or_else(|| AppError::unavailable("No extraction backend configured"))?;

    let processor = StatementProcessor::new(state.db.clone(), client);

    match processor.process(id, &owner).await {
        Ok(outcome) => {
            state.db.log_audit(
                &owner,
                "process",
                Some("statement"),
                Some(id),
                Some(&format!(
                    "transactions={}, insights={}",
                    outcome.transaction_count, outcome.insight_count
                )),
            )?;

            Ok(Json(ProcessResponse {
                success: true,
                data: Some(outcome),
                error: None,
            })
            .into_response())
        }
        Err(e @ CoreError::NotFound(_)) | Err(e @ CoreError::StageConflict { .. }) => {
            Err(map_core_error(e))
        }
        Err(e) => {
            state.db.log_audit(
                &owner,
                "process",
                Some("statement"),
                Some(id),
                Some(&format!("failed: {}", e)),
            )?;

            // The pipeline logs the underlying failure; callers get a
            // fixed message so backend and statement text never leak.
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ProcessResponse {
                    success: false,
                    data: None,
                    error: Some("Failed to process statement".to_string()),
                }),
            )
                .into_response())
        }
    }
}

/// Extraction backend health status
#[derive(Serialize)]
pub struct ExtractionHealth {
    pub configured: bool,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

/// GET /api/extraction/health - Live extraction backend health check
pub async fn extraction_health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ExtractionHealth>, AppError> {
    let health = match state.extractor {
        Some(ref client) => ExtractionHealth {
            configured: true,
            available: client.health_check().await,
            model: Some(client.model().to_string()),
            host: Some(client.host().to_string()),
        },
        None => ExtractionHealth {
            configured: false,
            available: false,
            model: None,
            host: None,
        },
    };

    Ok(Json(health))
}

//! Sift Web Server
//!
//! Axum-based REST API for the Sift statement dashboard.
//!
//! Security features:
//! - Authentication via fronting-proxy identity header or API keys
//!   (secure by default, use --no-auth for local dev)
//! - Restrictive CORS policy
//! - Input validation (upload size limits, PDF magic check)
//! - Full audit logging for all API access (reads and writes)
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use sift_core::ai::{ExtractionBackend, ExtractionClient};
use sift_core::db::Database;
use sift_core::Error as CoreError;

mod handlers;

/// Maximum file upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Identity header set by the fronting proxy for authenticated users
const IDENTITY_HEADER: &str = "x-authenticated-user";

/// Authorization header for API key auth
const AUTHORIZATION_HEADER: &str = "authorization";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether authentication is required (secure by default)
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only in production)
    pub allowed_origins: Vec<String>,
    /// API keys for internal service authentication
    /// Format: "Bearer <key>" in Authorization header
    pub api_keys: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
            api_keys: vec![],
        }
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    /// Extraction backend; None when not configured (uploads still work,
    /// processing returns 503)
    pub extractor: Option<ExtractionClient>,
}

/// Authentication middleware - validates the proxy identity header or API keys
///
/// # Security Notes
///
/// **Identity header**: The fronting proxy strips any client-supplied
/// `X-Authenticated-User` header and sets its own after authenticating the
/// user. This header must not be trusted if the server is exposed directly.
///
/// **API keys**: Compared using constant-time comparison to prevent timing
/// attacks.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth {
        return next.run(request).await;
    }

    // Check for the proxy identity header
    let identity = request
        .headers()
        .get(IDENTITY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());

    if let Some(user) = identity {
        info!(user = %user, path = %request.uri().path(), "Authenticated via identity header");
        return next.run(request).await;
    }

    // Check for API key in Authorization header (Bearer token)
    let api_key_valid = request
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|key| validate_api_key(key, &state.config.api_keys))
        .unwrap_or(false);

    if api_key_valid {
        info!(user = "api-key", path = %request.uri().path(), "Authenticated via API key");
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "Unauthorized request - no valid auth");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

/// Validate an API key against the configured keys using constant-time
/// comparison to prevent timing attacks.
fn validate_api_key(provided: &str, valid_keys: &[String]) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();

    for key in valid_keys {
        let key_bytes = key.as_bytes();
        // Only compare if lengths match (constant-time for same-length keys)
        if provided_bytes.len() == key_bytes.len() {
            if provided_bytes.ct_eq(key_bytes).into() {
                return true;
            }
        }
    }
    false
}

/// Extract the owner identifier from request headers (scopes all statement
/// access and feeds the audit log).
/// Returns the proxy identity, "api-key" for API key auth, or "local-dev"
/// for unauthenticated local use.
pub fn get_owner_id(headers: &axum::http::HeaderMap) -> String {
    if let Some(user) = headers
        .get(IDENTITY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
    {
        return user.to_string();
    }

    if headers
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .is_some()
    {
        return "api-key".to_string();
    }

    "local-dev".to_string()
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the application router
pub fn create_router(
    db: Database,
    extractor: Option<ExtractionClient>,
    config: ServerConfig,
) -> Router {
    if let Some(ref client) = extractor {
        info!(
            host = client.host(),
            model = client.model(),
            "Extraction backend configured"
        );
    } else {
        info!("Extraction backend not configured (set OPENROUTER_API_KEY or OLLAMA_HOST)");
    }

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        extractor,
    });

    let api_routes = Router::new()
        // Auth
        .route("/me", get(handlers::get_me))
        // Statements
        .route(
            "/statements",
            get(handlers::list_statements).post(handlers::upload_statement),
        )
        .route(
            "/statements/:id",
            get(handlers::get_statement_details).delete(handlers::delete_statement),
        )
        .route("/statements/:id/process", post(handlers::process_statement))
        // Extraction backend
        .route("/extraction/health", get(handlers::extraction_health))
        // Audit log
        .route("/audit", get(handlers::list_audit_log));

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
}

/// Start the server
pub async fn serve(db: Database, host: &str, port: u16) -> anyhow::Result<()> {
    serve_with_config(db, host, port, ServerConfig::default()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!("Authentication disabled - do not expose to network!");
    }

    let extractor = ExtractionClient::from_env();
    check_extraction_connection(&extractor).await;

    let app = create_router(db, extractor, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log extraction backend connection status
async fn check_extraction_connection(extractor: &Option<ExtractionClient>) {
    match extractor {
        Some(client) => {
            if client.health_check().await {
                info!(
                    host = client.host(),
                    model = client.model(),
                    "Extraction backend connected"
                );
            } else {
                warn!(
                    host = client.host(),
                    model = client.model(),
                    "Extraction backend configured but not responding"
                );
            }
        }
        None => {
            info!("Extraction backend not configured (set OPENROUTER_API_KEY or OLLAMA_HOST)");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn conflict(msg: &str) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn payload_too_large(msg: &str) -> Self {
        Self {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn unavailable(msg: &str) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: msg.to_string(),
            internal: None,
        }
    }
}

/// Map a core error to the appropriate HTTP status.
/// Database and pool failures stay generic so internals never leak.
pub(crate) fn map_core_error(err: CoreError) -> AppError {
    match err {
        CoreError::EmptyDocument => {
            AppError::bad_request("No text could be extracted from the document")
        }
        CoreError::DocumentTooLarge { actual, limit } => AppError::payload_too_large(&format!(
            "Extracted text is {} characters (limit {})",
            actual, limit
        )),
        CoreError::Document(msg) => AppError::bad_request(&msg),
        CoreError::DuplicateDocument { existing_id } => AppError::conflict(&format!(
            "This statement was already uploaded (statement {})",
            existing_id
        )),
        CoreError::NotFound(msg) => AppError::not_found(&msg),
        CoreError::StageConflict { actual, .. } => AppError::conflict(&format!(
            "Statement is {} and cannot be processed again",
            actual
        )),
        CoreError::InvalidData(msg) => AppError::bad_request(&msg),
        other => other.into(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;

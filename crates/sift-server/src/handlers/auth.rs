//! Authentication-related handlers

use std::sync::Arc;

use axum::extract::Request;
use axum::{extract::State, Json};
use serde::Serialize;

use crate::{get_owner_id, AppState};

/// Response for the /api/me endpoint
#[derive(Serialize)]
pub struct MeResponse {
    /// The authenticated user's identifier
    pub user: String,
    /// How the user was authenticated
    pub auth_method: String,
}

/// Get the currently authenticated user
pub async fn get_me(State(state): State<Arc<AppState>>, request: Request) -> Json<MeResponse> {
    let user = get_owner_id(request.headers());

    let auth_method = if user == "api-key" {
        "api_key"
    } else if user == "local-dev" {
        if state.config.require_auth {
            "unknown"
        } else {
            "none"
        }
    } else {
        "identity_header"
    };

    Json(MeResponse {
        user,
        auth_method: auth_method.to_string(),
    })
}

//! Shared-credential login and logout.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::middleware::{cleared_session_cookie, session_cookie, RequestId};

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub(super) struct SuccessResponse {
    success: bool,
}

/// POST /api/auth/login
///
/// The server secrets are checked first so a misconfigured production
/// deployment is reported regardless of what the caller sent.
pub(super) async fn login(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let rid = &req_id.0;

    let resolved = state.auth.credentials().map_err(|e| {
        tracing::error!(error = %e, "login unavailable");
        ApiError::new(rid, "misconfigured", e.to_string())
    })?;
    if resolved.using_dev_defaults {
        tracing::warn!("ADMIN_USER/ADMIN_PASS not set; accepting development credentials");
    }

    let Json(body) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected login body");
        ApiError::new(rid, "validation_error", "invalid payload")
    })?;

    if !resolved.credentials.verify(&body.username, &body.password) {
        tracing::info!("login rejected");
        return Err(ApiError::new(rid, "unauthorized", "Invalid credentials"));
    }

    tracing::info!("login accepted");
    Ok((
        [(header::SET_COOKIE, session_cookie(state.auth.secure_cookie()))],
        Json(SuccessResponse { success: true }),
    ))
}

/// POST /api/auth/logout: always succeeds, session or not.
pub(super) async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(
            header::SET_COOKIE,
            cleared_session_cookie(state.auth.secure_cookie()),
        )],
        Json(SuccessResponse { success: true }),
    )
}

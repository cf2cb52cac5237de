use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{
    auth,
    cookies::CookieJar,
    errors::{ApiError, ServerResult, WithApiError as _},
    state::AppState,
    user::{Admin, AdminUpsert},
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    cookies: CookieJar,
    Json(request): Json<LoginRequest>,
) -> ServerResult<Json<Value>, ApiError> {
    let session = auth::login_with_password(&state, &cookies, &request.email, &request.password)
        .await
        .with_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Login failed")?;

    match session {
        Some(_) => Ok(Json(json!({ "message": "Logged in" }))),
        None => Err(ApiError::new(StatusCode::UNAUTHORIZED, "Invalid credentials").into()),
    }
}

/// `POST /api/auth/logout`
pub async fn logout(
    State(state): State<AppState>,
    cookies: CookieJar,
) -> ServerResult<Json<Value>, ApiError> {
    auth::end_session(&state, &cookies)
        .await
        .with_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Logout failed")?;

    Ok(Json(json!({ "message": "Logged out" })))
}

/// `GET /api/setup-admin?email&password&token`
///
/// Only reachable when `ADMIN_SETUP_TOKEN` is configured; creates the admin or resets
/// its password.
pub async fn setup_admin(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ServerResult<Json<Value>, ApiError> {
    let Some(expected) = state.config.admin_setup_token.as_deref() else {
        return Err(ApiError::not_found("Not found").into());
    };

    if params.get("token").map(String::as_str) != Some(expected) {
        warn!("Rejected setup-admin call with a wrong token");
        return Err(ApiError::unauthorized().into());
    }

    let email = params.get("email").map(|e| e.trim()).filter(|e| !e.is_empty());
    let password = params.get("password").filter(|p| !p.is_empty());
    let (Some(email), Some(password)) = (email, password) else {
        return Err(ApiError::bad_request("Email and password are required").into());
    };

    let (admin, outcome) = Admin::upsert_with_password(&state.db, email, password)
        .await
        .with_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to set up admin")?;

    let message = match outcome {
        AdminUpsert::Created => "Admin created",
        AdminUpsert::PasswordReset => "Admin password reset",
    };
    info!(admin_id = %admin.id, message, "Admin setup");

    Ok(Json(json!({ "message": message, "email": admin.email })))
}

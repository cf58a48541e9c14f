//! Authentication API endpoints
//!
//! - POST /api/v1/auth/login - Admin login
//! - GET /api/v1/auth/session - Whether the presented session is live
//! - POST /api/v1/auth/logout - Admin logout (admin session required)

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::middleware::{
    extract_session_token, ApiError, ApiJson, AppState, AuthenticatedAdmin,
};
use crate::models::AdminSession;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
}

/// Routes reachable without a session
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/session", get(session_status))
}

/// Routes behind the admin session check
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/logout", post(logout))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<(HeaderMap, Json<AdminSession>), ApiError> {
    let session = state
        .auth_service
        .login(&body.email, &body.password)
        .await?;

    let max_age = (session.expires_at - Utc::now()).num_seconds().max(0);
    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        session.token, max_age
    );

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|_| ApiError::internal_error("Failed to build session cookie"))?,
    );

    Ok((response_headers, Json(session)))
}

/// GET /api/v1/auth/session
async fn session_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionStatus>, ApiError> {
    let authenticated = match extract_session_token(&headers) {
        Some(token) => state.auth_service.validate_session(&token).await?.is_some(),
        None => false,
    };

    Ok(Json(SessionStatus { authenticated }))
}

/// POST /api/v1/auth/logout
async fn logout(
    State(state): State<AppState>,
    AuthenticatedAdmin(admin): AuthenticatedAdmin,
    headers: HeaderMap,
) -> Result<(HeaderMap, StatusCode), ApiError> {
    let token = extract_session_token(&headers);
    state.auth_service.logout(token.as_deref()).await?;
    tracing::info!("Admin {} logged out", admin.email);

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
    );

    Ok((response_headers, StatusCode::NO_CONTENT))
}

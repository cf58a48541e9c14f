//! API middleware
//!
//! Contains:
//! - Application state shared by every handler
//! - The uniform API error type and its mapping from service errors
//! - Admin session validation for the `/admin` routes

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request, State,
    },
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cache::SharedCache;
use crate::config::AuthConfig;
use crate::db::repositories::{
    SqlxAdminRepository, SqlxContentRepository, SqlxSessionRepository, SqlxSingletonRepository,
};
use crate::db::DynDatabasePool;
use crate::models::Admin;
use crate::services::{
    AuthService, AuthServiceError, ContentService, ContentServiceError, FrontMatterService,
    LoginRateLimiter, ReaderService,
};

/// Seconds a rate-limited client is told to wait
const RETRY_AFTER_SECONDS: u64 = 15 * 60;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub content_service: Arc<ContentService>,
    pub front_matter_service: Arc<FrontMatterService>,
    pub reader_service: Arc<ReaderService>,
}

impl AppState {
    /// Wire repositories and services over one pool and cache
    pub fn new(pool: DynDatabasePool, cache: SharedCache, auth: &AuthConfig) -> Self {
        let auth_service = Arc::new(AuthService::with_session_days(
            SqlxAdminRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
            Arc::new(LoginRateLimiter::new()),
            auth.session_days,
        ));
        let content_service = Arc::new(ContentService::new(
            SqlxContentRepository::boxed(pool.clone()),
            cache.clone(),
        ));
        let front_matter_service = Arc::new(FrontMatterService::new(
            SqlxSingletonRepository::boxed(pool),
            cache,
        ));
        let reader_service = Arc::new(ReaderService::new(
            content_service.clone(),
            front_matter_service.clone(),
        ));

        Self {
            auth_service,
            content_service,
            front_matter_service,
            reader_service,
        }
    }
}

/// Admin resolved from a valid session
#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin(pub Admin);

impl<S> FromRequestParts<S> for AuthenticatedAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedAdmin>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// JSON body extractor that rejects with `ApiError`
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::validation_error(rejection.body_text())),
        }
    }
}

/// Query string extractor that rejects with `ApiError`
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::validation_error(rejection.body_text())),
        }
    }
}

/// Path parameter extractor that rejects with `ApiError`
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    Path<T>: FromRequestParts<S, Rejection = PathRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::validation_error(rejection.body_text())),
        }
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFIRMATION_REQUIRED" => StatusCode::PRECONDITION_REQUIRED,
            "RATE_LIMIT" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ContentServiceError> for ApiError {
    fn from(err: ContentServiceError) -> Self {
        match err {
            ContentServiceError::Validation(msg) => ApiError::validation_error(msg),
            ContentServiceError::NotFound(msg) => ApiError::not_found(format!("{} not found", msg)),
            ContentServiceError::ConfirmationRequired => ApiError::with_details(
                "CONFIRMATION_REQUIRED",
                "Deletion must be confirmed",
                serde_json::json!({ "confirm": true }),
            ),
            ContentServiceError::Internal(e) => {
                tracing::error!("Content operation failed: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<AuthServiceError> for ApiError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::InvalidCredentials => {
                ApiError::unauthorized("Invalid email or password")
            }
            AuthServiceError::RateLimited => ApiError::with_details(
                "RATE_LIMIT",
                "Too many failed login attempts, please try again later",
                serde_json::json!({ "retry_after": RETRY_AFTER_SECONDS }),
            ),
            AuthServiceError::Internal(e) => {
                tracing::error!("Auth operation failed: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

/// Session token from `Authorization: Bearer` or the `session` cookie.
///
/// The bearer header wins when both are present.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                let token = token.trim();
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }

    for cookie_header in headers.get_all(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                if let Some(token) = cookie.trim().strip_prefix("session=") {
                    if !token.is_empty() {
                        return Some(token.to_string());
                    }
                }
            }
        }
    }

    None
}

/// Admin session middleware
pub async fn require_admin_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let admin = state
        .auth_service
        .validate_session(&token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    request.extensions_mut().insert(AuthenticatedAdmin(admin));
    Ok(next.run(request).await)
}

//! Cover page and editorial endpoints
//!
//! - GET /api/v1/cover - Public cover page, `null` until one is saved
//! - GET|PUT /api/v1/admin/cover
//! - GET|PUT /api/v1/admin/editorial
//!
//! The editorial is read publicly through the magazine's first page.

use axum::{extract::State, routing::get, Json, Router};

use crate::api::middleware::{ApiError, ApiJson, AppState, AuthenticatedAdmin};
use crate::models::{CoverPage, CoverPageInput, Editorial, EditorialInput};

pub fn public_router() -> Router<AppState> {
    Router::new().route("/cover", get(get_cover))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/cover", get(get_cover).put(save_cover))
        .route("/editorial", get(get_editorial).put(save_editorial))
}

async fn get_cover(State(state): State<AppState>) -> Result<Json<Option<CoverPage>>, ApiError> {
    Ok(Json(state.front_matter_service.get_cover().await?))
}

async fn save_cover(
    State(state): State<AppState>,
    AuthenticatedAdmin(admin): AuthenticatedAdmin,
    ApiJson(input): ApiJson<CoverPageInput>,
) -> Result<Json<CoverPage>, ApiError> {
    let cover = state.front_matter_service.save_cover(input).await?;
    tracing::info!("{} saved the cover page", admin.email);
    Ok(Json(cover))
}

async fn get_editorial(State(state): State<AppState>) -> Result<Json<Option<Editorial>>, ApiError> {
    Ok(Json(state.front_matter_service.get_editorial().await?))
}

async fn save_editorial(
    State(state): State<AppState>,
    AuthenticatedAdmin(admin): AuthenticatedAdmin,
    ApiJson(input): ApiJson<EditorialInput>,
) -> Result<Json<Editorial>, ApiError> {
    let editorial = state.front_matter_service.save_editorial(input).await?;
    tracing::info!("{} saved the editorial", admin.email);
    Ok(Json(editorial))
}

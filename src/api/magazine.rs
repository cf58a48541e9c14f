//! Reader API endpoints
//!
//! - GET /api/v1/magazine/pages - Table of contents
//! - GET /api/v1/magazine/pages/{index} - One page, optionally `?tag=` filtered

use axum::{extract::State, routing::get, Json, Router};
use serde::Deserialize;

use crate::api::middleware::{ApiError, ApiPath, ApiQuery, AppState};
use crate::models::{table_of_contents, PageEntry};
use crate::services::PageView;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub tag: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pages", get(list_pages))
        .route("/pages/{index}", get(get_page))
}

async fn list_pages() -> Json<Vec<PageEntry>> {
    Json(table_of_contents())
}

async fn get_page(
    State(state): State<AppState>,
    ApiPath(index): ApiPath<usize>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<PageView>, ApiError> {
    let tag = query.tag.as_deref().filter(|t| !t.is_empty());
    Ok(Json(state.reader_service.page(index, tag).await?))
}

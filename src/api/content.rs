//! Section content API endpoints
//!
//! Public:
//! - GET /api/v1/sections/{section}/items - Reader list of one section
//!
//! Admin:
//! - GET /api/v1/admin/sections - Section descriptors for the dashboard
//! - GET|POST /api/v1/admin/sections/{section}/items
//! - GET|PUT|DELETE /api/v1/admin/sections/{section}/items/{id}
//!
//! Every mutation answers with the affected item and the section's list as
//! it stands afterwards.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, ApiJson, ApiPath, ApiQuery, AppState, AuthenticatedAdmin};
use crate::models::schema::{COVER_PAGE, EDITORIAL};
use crate::models::{CollectionSchema, ContentDraft, ContentItem, Section, SingletonSchema};
use crate::services::Confirmation;

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
pub struct ItemListResponse {
    pub section: Section,
    pub items: Vec<ContentItem>,
}

/// A mutated item together with the refreshed list
#[derive(Debug, Serialize)]
pub struct ItemMutationResponse {
    pub item: ContentItem,
    pub items: Vec<ContentItem>,
}

#[derive(Debug, Serialize)]
pub struct SectionSummary {
    #[serde(flatten)]
    pub schema: &'static CollectionSchema,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct SectionsResponse {
    pub sections: Vec<SectionSummary>,
    pub singletons: Vec<&'static SingletonSchema>,
}

pub fn public_router() -> Router<AppState> {
    Router::new().route("/{section}/items", get(list_items))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sections))
        .route("/{section}/items", get(list_items).post(submit_item))
        .route(
            "/{section}/items/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
}

fn parse_section(raw: &str) -> Result<Section, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::not_found(format!("Unknown section '{}'", raw)))
}

/// GET /api/v1/admin/sections
async fn list_sections(State(state): State<AppState>) -> Result<Json<SectionsResponse>, ApiError> {
    let mut sections = Vec::with_capacity(Section::ALL.len());
    for section in Section::ALL {
        sections.push(SectionSummary {
            schema: section.schema(),
            count: state.content_service.count(section).await?,
        });
    }

    Ok(Json(SectionsResponse {
        sections,
        singletons: vec![&COVER_PAGE, &EDITORIAL],
    }))
}

/// GET /api/v1/sections/{section}/items
async fn list_items(
    State(state): State<AppState>,
    ApiPath(section): ApiPath<String>,
) -> Result<Json<ItemListResponse>, ApiError> {
    let section = parse_section(&section)?;
    let items = state.content_service.list(section).await?;
    Ok(Json(ItemListResponse { section, items }))
}

/// POST /api/v1/admin/sections/{section}/items
///
/// Creates an item, or updates one when the body carries `editing_id`.
async fn submit_item(
    State(state): State<AppState>,
    AuthenticatedAdmin(admin): AuthenticatedAdmin,
    ApiPath(section): ApiPath<String>,
    ApiJson(draft): ApiJson<ContentDraft>,
) -> Result<(StatusCode, Json<ItemMutationResponse>), ApiError> {
    let section = parse_section(&section)?;
    let (status, action) = if draft.editing_id.is_some() {
        (StatusCode::OK, "updated")
    } else {
        (StatusCode::CREATED, "created")
    };

    let item = state.content_service.submit(section, draft).await?;
    tracing::info!("{} {} {} item {}", admin.email, action, section, item.id);

    let items = state.content_service.list(section).await?;
    Ok((status, Json(ItemMutationResponse { item, items })))
}

/// GET /api/v1/admin/sections/{section}/items/{id}
async fn get_item(
    State(state): State<AppState>,
    ApiPath((section, id)): ApiPath<(String, i64)>,
) -> Result<Json<ContentItem>, ApiError> {
    let section = parse_section(&section)?;
    Ok(Json(state.content_service.get(section, id).await?))
}

/// PUT /api/v1/admin/sections/{section}/items/{id}
async fn update_item(
    State(state): State<AppState>,
    AuthenticatedAdmin(admin): AuthenticatedAdmin,
    ApiPath((section, id)): ApiPath<(String, i64)>,
    ApiJson(patch): ApiJson<serde_json::Map<String, serde_json::Value>>,
) -> Result<Json<ItemMutationResponse>, ApiError> {
    let section = parse_section(&section)?;
    let item = state.content_service.update(section, id, patch).await?;
    tracing::info!("{} updated {} item {}", admin.email, section, id);

    let items = state.content_service.list(section).await?;
    Ok(Json(ItemMutationResponse { item, items }))
}

/// DELETE /api/v1/admin/sections/{section}/items/{id}?confirm=true
async fn delete_item(
    State(state): State<AppState>,
    AuthenticatedAdmin(admin): AuthenticatedAdmin,
    ApiPath((section, id)): ApiPath<(String, i64)>,
    ApiQuery(query): ApiQuery<DeleteQuery>,
) -> Result<Json<ItemListResponse>, ApiError> {
    let section = parse_section(&section)?;
    state
        .content_service
        .delete(section, id, Confirmation::from(query.confirm))
        .await?;
    tracing::info!("{} deleted {} item {}", admin.email, section, id);

    let items = state.content_service.list(section).await?;
    Ok(Json(ItemListResponse { section, items }))
}

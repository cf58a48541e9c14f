//! API layer - HTTP handlers and routing
//!
//! Public endpoints serve the reader (cover, table of contents, pages and
//! section lists). Everything under `/admin` plus logout requires a live
//! admin session.

pub mod auth;
pub mod content;
pub mod front_matter;
pub mod magazine;
pub mod middleware;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{extract_session_token, ApiError, AppState, AuthenticatedAdmin};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need a valid session)
    let admin_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/admin", front_matter::admin_router())
        .nest("/admin/sections", content::admin_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_admin_session,
        ));

    // Public routes
    Router::new()
        .nest("/auth", auth::public_router())
        .nest("/magazine", magazine::router())
        .nest("/sections", content::public_router())
        .merge(front_matter::public_router())
        .merge(admin_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> anyhow::Result<Router> {
    // Cookie sessions need credentials, which rules out a wildcard origin
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Ok(Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::config::AuthConfig;
    use crate::db::{create_test_pool, migrations};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use std::sync::Arc;

    const EMAIL: &str = "7c@magazine.com";
    const PASSWORD: &str = "7cmagazine";

    async fn setup_server() -> TestServer {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let state = AppState::new(pool, Arc::new(MemoryCache::new()), &AuthConfig::default());
        state
            .auth_service
            .seed_admin(EMAIL, PASSWORD)
            .await
            .expect("Failed to seed admin");

        let router = build_router(state, "http://localhost:5173").expect("Failed to build router");
        TestServer::new(router).expect("Failed to start test server")
    }

    async fn login(server: &TestServer) -> String {
        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": EMAIL, "password": PASSWORD }))
            .await;
        response.assert_status_ok();
        response.json::<Value>()["token"]
            .as_str()
            .expect("token in login response")
            .to_string()
    }

    fn poem(title: &str) -> Value {
        json!({
            "type": "poetry",
            "title": title,
            "content": "Raindrops on the window",
            "author_name": "Meera"
        })
    }

    #[tokio::test]
    async fn test_login_sets_cookie_and_session() {
        let server = setup_server().await;

        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": EMAIL, "password": PASSWORD }))
            .await;
        response.assert_status_ok();

        let cookie = response.header("set-cookie");
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("session="));
        assert!(cookie.contains("HttpOnly"));

        let token = response.json::<Value>()["token"].as_str().unwrap().to_string();
        let status = server
            .get("/api/v1/auth/session")
            .authorization_bearer(&token)
            .await;
        assert_eq!(status.json::<Value>(), json!({ "authenticated": true }));
    }

    #[tokio::test]
    async fn test_wrong_credentials_are_unauthorized() {
        let server = setup_server().await;

        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": EMAIL, "password": "guess" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["error"]["code"], "UNAUTHORIZED");

        let status = server.get("/api/v1/auth/session").await;
        assert_eq!(status.json::<Value>(), json!({ "authenticated": false }));
    }

    #[tokio::test]
    async fn test_repeated_failures_are_rate_limited() {
        let server = setup_server().await;

        for _ in 0..5 {
            server
                .post("/api/v1/auth/login")
                .json(&json!({ "email": EMAIL, "password": "guess" }))
                .await
                .assert_status(StatusCode::UNAUTHORIZED);
        }

        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": EMAIL, "password": PASSWORD }))
            .await;
        response.assert_status(StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.json::<Value>()["error"]["details"]["retry_after"], 900);
    }

    #[tokio::test]
    async fn test_admin_routes_require_session() {
        let server = setup_server().await;

        server
            .get("/api/v1/admin/sections")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .post("/api/v1/admin/sections/creative_writing/items")
            .json(&poem("Rain"))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .get("/api/v1/admin/cover")
            .authorization_bearer("not-a-session")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_ends_session() {
        let server = setup_server().await;
        let token = login(&server).await;

        let response = server
            .post("/api/v1/auth/logout")
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::NO_CONTENT);
        assert!(response
            .header("set-cookie")
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));

        server
            .get("/api/v1/admin/sections")
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_section_crud_returns_refreshed_list() {
        let server = setup_server().await;
        let token = login(&server).await;

        let created = server
            .post("/api/v1/admin/sections/creative_writing/items")
            .authorization_bearer(&token)
            .json(&poem("Rain"))
            .await;
        created.assert_status(StatusCode::CREATED);
        let body = created.json::<Value>();
        let id = body["item"]["id"].as_i64().unwrap();
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
        assert!(body["item"]["created_at"].is_string());

        let updated = server
            .put(&format!("/api/v1/admin/sections/creative_writing/items/{}", id))
            .authorization_bearer(&token)
            .json(&json!({ "title": "Monsoon" }))
            .await;
        updated.assert_status_ok();
        let body = updated.json::<Value>();
        assert_eq!(body["item"]["title"], "Monsoon");
        assert_eq!(body["item"]["author_name"], "Meera");
        assert_eq!(body["items"][0]["title"], "Monsoon");

        // Editing through the form submit keeps the same row
        let resubmitted = server
            .post("/api/v1/admin/sections/creative_writing/items")
            .authorization_bearer(&token)
            .json(&json!({ "editing_id": id, "title": "Monsoon Song" }))
            .await;
        resubmitted.assert_status_ok();
        assert_eq!(resubmitted.json::<Value>()["items"].as_array().unwrap().len(), 1);

        let public = server.get("/api/v1/sections/creative-writing/items").await;
        public.assert_status_ok();
        assert_eq!(public.json::<Value>()["items"][0]["title"], "Monsoon Song");

        let deleted = server
            .delete(&format!(
                "/api/v1/admin/sections/creative_writing/items/{}?confirm=true",
                id
            ))
            .authorization_bearer(&token)
            .await;
        deleted.assert_status_ok();
        assert_eq!(deleted.json::<Value>()["items"], json!([]));

        server
            .get(&format!("/api/v1/admin/sections/creative_writing/items/{}", id))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_without_confirmation_is_refused() {
        let server = setup_server().await;
        let token = login(&server).await;

        let created = server
            .post("/api/v1/admin/sections/creative_writing/items")
            .authorization_bearer(&token)
            .json(&poem("Keep me"))
            .await;
        let id = created.json::<Value>()["item"]["id"].as_i64().unwrap();

        let response = server
            .delete(&format!("/api/v1/admin/sections/creative_writing/items/{}", id))
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::PRECONDITION_REQUIRED);
        assert_eq!(response.json::<Value>()["error"]["code"], "CONFIRMATION_REQUIRED");

        let list = server.get("/api/v1/sections/creative_writing/items").await;
        assert_eq!(list.json::<Value>()["items"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_validation_and_unknown_section() {
        let server = setup_server().await;
        let token = login(&server).await;

        let response = server
            .post("/api/v1/admin/sections/creative_writing/items")
            .authorization_bearer(&token)
            .json(&json!({ "type": "limerick", "title": "x", "content": "y", "author_name": "z" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_ERROR");

        server
            .get("/api/v1/sections/gossip/items")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_requests_get_error_body() {
        let server = setup_server().await;
        let token = login(&server).await;

        let bad_body = server
            .post("/api/v1/admin/sections/creative_writing/items")
            .authorization_bearer(&token)
            .json(&json!({ "editing_id": "abc" }))
            .await;
        let bad_query = server
            .delete("/api/v1/admin/sections/creative_writing/items/1?confirm=yes")
            .authorization_bearer(&token)
            .await;
        let bad_id = server
            .get("/api/v1/admin/sections/creative_writing/items/first")
            .authorization_bearer(&token)
            .await;
        let bad_page = server.get("/api/v1/magazine/pages/abc").await;
        let bad_login = server
            .post("/api/v1/auth/login")
            .text("email=7c@magazine.com")
            .await;

        for response in [bad_body, bad_query, bad_id, bad_page, bad_login] {
            response.assert_status(StatusCode::BAD_REQUEST);
            let body = response.json::<Value>();
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
            assert!(body["error"]["message"].is_string());
        }
    }

    #[tokio::test]
    async fn test_dashboard_lists_every_section() {
        let server = setup_server().await;
        let token = login(&server).await;

        let response = server
            .get("/api/v1/admin/sections")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["sections"].as_array().unwrap().len(), 10);
        assert_eq!(body["sections"][0]["key"], "creative_writing");
        assert_eq!(body["sections"][0]["count"], 0);
        assert_eq!(body["singletons"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cover_saved_twice_reads_back_latest() {
        let server = setup_server().await;
        let token = login(&server).await;

        assert_eq!(server.get("/api/v1/cover").await.json::<Value>(), Value::Null);

        let cover = json!({
            "title": "Horizons",
            "subtitle": "Class Magazine",
            "class_name": "7C",
            "theme_quote": "Dream big"
        });
        let first = server
            .put("/api/v1/admin/cover")
            .authorization_bearer(&token)
            .json(&cover)
            .await;
        first.assert_status_ok();
        let second = server
            .put("/api/v1/admin/cover")
            .authorization_bearer(&token)
            .json(&cover)
            .await;
        second.assert_status_ok();

        let public = server.get("/api/v1/cover").await.json::<Value>();
        assert_eq!(public["title"], "Horizons");
        assert_eq!(public["updated_at"], second.json::<Value>()["updated_at"]);
    }

    #[tokio::test]
    async fn test_magazine_pages() {
        let server = setup_server().await;

        let toc = server.get("/api/v1/magazine/pages").await.json::<Value>();
        assert_eq!(toc.as_array().unwrap().len(), 11);
        assert_eq!(toc[0]["title"], "Editorial");

        let first = server.get("/api/v1/magazine/pages/0").await.json::<Value>();
        assert_eq!(first["position"]["previous"], Value::Null);
        assert_eq!(first["content"]["kind"], "editorial");

        let last = server.get("/api/v1/magazine/pages/10").await.json::<Value>();
        assert_eq!(last["title"], "Media Gallery");
        assert_eq!(last["position"]["next"], Value::Null);

        server
            .get("/api/v1/magazine/pages/11")
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .get("/api/v1/magazine/pages/10?tag=audio")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

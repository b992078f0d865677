use super::handlers::{comments, moderation, publish, sse};
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

pub fn build_router(state: AppState, allowed_origins: &str) -> Router {
    let methods = [Method::GET, Method::POST, Method::DELETE];
    let cors = if allowed_origins == "*" {
        CorsLayer::new()
            .allow_methods(methods)
            .allow_origin(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse::<HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            tracing::warn!("CORS config is invalid or empty, falling back to allow ANY.");
            CorsLayer::new()
                .allow_methods(methods)
                .allow_origin(Any)
                .allow_headers(Any)
        } else {
            tracing::info!("CORS enabled for origins: {:?}", origins);
            CorsLayer::new()
                .allow_methods(methods)
                .allow_origin(origins)
                .allow_headers(Any)
        }
    };

    Router::new()
        .route("/api/skills/:slug/publish", post(publish::publish_skill))
        .route(
            "/api/skills/:slug/comments",
            get(comments::list_comments).post(comments::post_comment),
        )
        .route("/api/skills/:slug/comments/sse", get(sse::sse_handler))
        .route("/api/comments/:id/report", post(moderation::report_comment))
        .route("/api/comments/:id/hide", post(moderation::hide_comment))
        .route("/api/comments/:id/restore", post(moderation::restore_comment))
        .route("/api/comments/:id", delete(moderation::delete_comment))
        .route("/api/comments/:id/purge", delete(moderation::purge_comment))
        .route("/api/comments/:id/audit", get(moderation::comment_audit))
        .layer(cors)
        .with_state(state)
}

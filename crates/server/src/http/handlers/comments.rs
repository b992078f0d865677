use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;

use super::map_core_error;
use crate::auth::require_actor;
use crate::state::AppState;
use domain::{Comment, SkillSlug};

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(slug_str): Path<String>,
) -> Result<Json<Vec<Comment>>, (StatusCode, String)> {
    if SkillSlug::new(&slug_str).is_err() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Invalid skill slug format".to_string(),
        ));
    }

    let comments = state
        .moderation
        .list_comments(&slug_str)
        .await
        .map_err(map_core_error)?;
    Ok(Json(comments))
}

pub async fn post_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slug_str): Path<String>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<Json<Comment>, (StatusCode, String)> {
    let actor = require_actor(&headers, &state.db, &state.token_secret).await?;
    let slug = SkillSlug::new(slug_str).map_err(|e| (StatusCode::BAD_REQUEST, e))?;

    let comment = state
        .moderation
        .add_comment(&actor, slug.as_str(), &payload.body)
        .await
        .map_err(map_core_error)?;
    Ok(Json(comment))
}

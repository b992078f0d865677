use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use super::map_core_error;
use crate::auth::require_actor;
use crate::state::AppState;
use domain::{QualityAssessment, SkillSlug};

#[derive(Deserialize)]
pub struct PublishRequest {
    pub document_ref: String,
}

#[derive(Serialize)]
pub struct PublishResponse {
    pub slug: String,
    pub version: i64,
    // 仅新 slug 的首次发布带质检结论
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<QualityAssessment>,
}

pub async fn publish_skill(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slug_str): Path<String>,
    Json(payload): Json<PublishRequest>,
) -> Result<Json<PublishResponse>, (StatusCode, String)> {
    let actor = require_actor(&headers, &state.db, &state.token_secret).await?;
    let slug = SkillSlug::new(slug_str).map_err(|e| (StatusCode::BAD_REQUEST, e))?;

    let outcome = state
        .publish
        .publish(&actor, &slug, &payload.document_ref)
        .await
        .map_err(map_core_error)?;

    Ok(Json(PublishResponse {
        slug: outcome.skill.slug.to_string(),
        version: outcome.version.version,
        assessment: outcome.assessment,
    }))
}

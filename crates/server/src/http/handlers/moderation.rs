use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use super::map_core_error;
use crate::auth::require_actor;
use crate::state::AppState;
use domain::AuditLogEntry;

#[derive(Deserialize)]
pub struct ReportRequest {
    pub reason: String,
}

#[derive(Serialize)]
pub struct ReportResponse {
    pub reported: bool,
    pub already_reported: bool,
    pub auto_hidden: bool,
}

#[derive(Deserialize, Default)]
pub struct HideRequest {
    pub reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct ChangedResponse {
    pub changed: bool,
}

pub async fn report_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(comment_id): Path<String>,
    Json(payload): Json<ReportRequest>,
) -> Result<Json<ReportResponse>, (StatusCode, String)> {
    let actor = require_actor(&headers, &state.db, &state.token_secret).await?;
    let outcome = state
        .moderation
        .report(&actor, &comment_id, &payload.reason)
        .await
        .map_err(map_core_error)?;
    Ok(Json(ReportResponse {
        reported: outcome.reported,
        already_reported: outcome.already_reported,
        auto_hidden: outcome.auto_hidden,
    }))
}

pub async fn hide_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(comment_id): Path<String>,
    payload: Option<Json<HideRequest>>,
) -> Result<Json<ChangedResponse>, (StatusCode, String)> {
    let actor = require_actor(&headers, &state.db, &state.token_secret).await?;
    let Json(payload) = payload.unwrap_or_default();
    let outcome = state
        .moderation
        .hide(&actor, &comment_id, payload.reason, payload.notes)
        .await
        .map_err(map_core_error)?;
    Ok(Json(ChangedResponse {
        changed: outcome.changed,
    }))
}

pub async fn restore_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(comment_id): Path<String>,
) -> Result<Json<ChangedResponse>, (StatusCode, String)> {
    let actor = require_actor(&headers, &state.db, &state.token_secret).await?;
    let outcome = state
        .moderation
        .restore(&actor, &comment_id)
        .await
        .map_err(map_core_error)?;
    Ok(Json(ChangedResponse {
        changed: outcome.changed,
    }))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(comment_id): Path<String>,
) -> Result<Json<ChangedResponse>, (StatusCode, String)> {
    let actor = require_actor(&headers, &state.db, &state.token_secret).await?;
    let outcome = state
        .moderation
        .remove(&actor, &comment_id)
        .await
        .map_err(map_core_error)?;
    Ok(Json(ChangedResponse {
        changed: outcome.changed,
    }))
}

pub async fn purge_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(comment_id): Path<String>,
) -> Result<Json<&'static str>, (StatusCode, String)> {
    let actor = require_actor(&headers, &state.db, &state.token_secret).await?;
    state
        .moderation
        .hard_delete(&actor, &comment_id)
        .await
        .map_err(map_core_error)?;
    Ok(Json("Purged"))
}

pub async fn comment_audit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(comment_id): Path<String>,
) -> Result<Json<Vec<AuditLogEntry>>, (StatusCode, String)> {
    let actor = require_actor(&headers, &state.db, &state.token_secret).await?;
    let entries = state
        .moderation
        .audit_trail(&actor, &comment_id)
        .await
        .map_err(map_core_error)?;
    Ok(Json(entries))
}

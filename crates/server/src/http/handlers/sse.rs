use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};

use crate::state::AppState;
use domain::ModerationEvent;

// 按 slug 过滤的审核事件流，前端用来实时刷新评论区
pub async fn sse_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let rx = state.tx_events.subscribe();

    tracing::info!("SSE Connected: skill={}", slug);

    let stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(event) => {
            let (event_slug, name, data) = match &event {
                ModerationEvent::CommentAdded { skill_slug, comment } => (
                    skill_slug.clone(),
                    "new_comment",
                    serde_json::to_value(comment),
                ),
                ModerationEvent::CommentHidden { skill_slug, comment_id } => (
                    skill_slug.clone(),
                    "hide_comment",
                    Ok(serde_json::json!({ "id": comment_id })),
                ),
                ModerationEvent::CommentRestored { skill_slug, comment_id } => (
                    skill_slug.clone(),
                    "restore_comment",
                    Ok(serde_json::json!({ "id": comment_id })),
                ),
                ModerationEvent::CommentRemoved { skill_slug, comment_id } => (
                    skill_slug.clone(),
                    "delete_comment",
                    Ok(serde_json::json!({ "id": comment_id })),
                ),
            };
            if event_slug != slug {
                return None;
            }
            match data {
                Ok(value) => Some(Event::default().event(name).json_data(value).map_err(|e| {
                    tracing::error!("SSE serialization error: {}", e);
                    axum::Error::new(e)
                })),
                Err(e) => {
                    tracing::error!("SSE serialization error: {}", e);
                    None
                }
            }
        }
        Err(_lagged) => {
            tracing::warn!("SSE Client lagged for {}", slug);
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(std::time::Duration::from_secs(15)))
}

use crate::models::Comment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModerationEvent {
    CommentAdded {
        skill_slug: String,
        comment: Comment,
    },
    CommentHidden {
        skill_slug: String,
        comment_id: String,
    },
    CommentRestored {
        skill_slug: String,
        comment_id: String,
    },
    CommentRemoved {
        skill_slug: String,
        comment_id: String,
    },
}

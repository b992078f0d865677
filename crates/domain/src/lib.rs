mod auth;
mod errors;
mod events;
mod models;

pub mod fingerprint;
pub mod quality;
pub mod signals;
pub mod trust;

pub use auth::{assert_admin, assert_moderator};
pub use errors::CoreError;
pub use events::ModerationEvent;
pub use models::{
    Account, Actor, AuditLogEntry, Comment, CommentReport, ModerationState, ModerationStatus,
    Role, Skill, SkillSlug, SkillVersion, StatEvent, StatKind,
};
pub use quality::{QualityAssessment, QualityDecision};
pub use signals::QualitySignals;
pub use trust::TrustTier;

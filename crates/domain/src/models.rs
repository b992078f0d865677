use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::quality::QualityAssessment;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillSlug(String);

impl SkillSlug {
    pub fn new(s: impl Into<String>) -> Result<Self, String> {
        let s = s.into();
        if s.is_empty() {
            return Err("Skill slug cannot be empty.".to_string());
        }
        if s.contains('_') {
            return Err("Skill slug cannot contain underscores ('_'). Please use hyphens ('-') or dots ('.') instead.".to_string());
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
        {
            return Err("Skill slug contains invalid characters.".to_string());
        }
        if s.len() > 64 {
            return Err("Skill slug is too long (max 64 chars).".to_string());
        }
        Ok(Self(s))
    }

    pub fn new_unchecked(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SkillSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    Active,
    Hidden,
    Removed,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Active => "active",
            ModerationStatus::Hidden => "hidden",
            ModerationStatus::Removed => "removed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ModerationStatus::Active),
            "hidden" => Some(ModerationStatus::Hidden),
            "removed" => Some(ModerationStatus::Removed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub skill_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: NaiveDateTime,
    pub moderation_status: ModerationStatus,
    pub moderation_reason: Option<String>,
    pub moderation_notes: Option<String>,
    pub report_count: i64,
    pub last_reported_at: Option<NaiveDateTime>,
    pub hidden_at: Option<NaiveDateTime>,
    pub deleted_by: Option<String>,
    pub last_reviewed_at: Option<NaiveDateTime>,
}

impl Comment {
    // 可见性是派生属性，不单独存储
    pub fn is_visible(&self) -> bool {
        self.moderation_status == ModerationStatus::Active && self.deleted_by.is_none()
    }
}

// 状态迁移以整体替换的方式写入，避免稀疏 patch 的"清空字段"歧义
#[derive(Debug, Clone)]
pub struct ModerationState {
    pub status: ModerationStatus,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub hidden_at: Option<NaiveDateTime>,
    pub deleted_by: Option<String>,
    pub last_reviewed_at: Option<NaiveDateTime>,
}

impl ModerationState {
    pub fn of(comment: &Comment) -> Self {
        Self {
            status: comment.moderation_status,
            reason: comment.moderation_reason.clone(),
            notes: comment.moderation_notes.clone(),
            hidden_at: comment.hidden_at,
            deleted_by: comment.deleted_by.clone(),
            last_reviewed_at: comment.last_reviewed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentReport {
    pub id: String,
    pub comment_id: String,
    pub skill_id: String,
    pub reporter_id: String,
    pub reason: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub actor_id: String,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub metadata: serde_json::Value,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    Comment,
    Uncomment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatEvent {
    pub skill_id: String,
    pub kind: StatKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "moderator" => Some(Role::Moderator),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub role: Role,
    pub created_at: NaiveDateTime,
    pub deactivated_at: Option<NaiveDateTime>,
}

impl Account {
    pub fn is_deactivated(&self) -> bool {
        self.deactivated_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub slug: SkillSlug,
    pub owner_id: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillVersion {
    pub id: String,
    pub skill_id: String,
    pub version: i64,
    pub document_ref: String,
    pub fingerprint: String,
    // 仅新 slug 的首个版本带有质检结论，后续更新跳过质检
    pub assessment: Option<QualityAssessment>,
    pub created_at: NaiveDateTime,
}

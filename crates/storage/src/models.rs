use chrono::NaiveDateTime;
use domain::{
    Account, AuditLogEntry, Comment, CommentReport, ModerationStatus, Role, Skill, SkillSlug,
    SkillVersion,
};
use sqlx::FromRow;

#[derive(FromRow)]
pub struct SqlComment {
    pub id: String,
    pub skill_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: NaiveDateTime,
    pub moderation_status: String,
    pub moderation_reason: Option<String>,
    pub moderation_notes: Option<String>,
    pub report_count: i64,
    pub last_reported_at: Option<NaiveDateTime>,
    pub hidden_at: Option<NaiveDateTime>,
    pub deleted_by: Option<String>,
    pub last_reviewed_at: Option<NaiveDateTime>,
}

impl From<SqlComment> for Comment {
    fn from(sql: SqlComment) -> Self {
        Comment {
            id: sql.id,
            skill_id: sql.skill_id,
            author_id: sql.author_id,
            body: sql.body,
            created_at: sql.created_at,
            // 库里只会出现这三个值，异常数据按 removed 处理（最保守）
            moderation_status: ModerationStatus::parse(&sql.moderation_status)
                .unwrap_or(ModerationStatus::Removed),
            moderation_reason: sql.moderation_reason,
            moderation_notes: sql.moderation_notes,
            report_count: sql.report_count,
            last_reported_at: sql.last_reported_at,
            hidden_at: sql.hidden_at,
            deleted_by: sql.deleted_by,
            last_reviewed_at: sql.last_reviewed_at,
        }
    }
}

#[derive(FromRow)]
pub struct SqlReport {
    pub id: String,
    pub comment_id: String,
    pub skill_id: String,
    pub reporter_id: String,
    pub reason: String,
    pub created_at: NaiveDateTime,
}

impl From<SqlReport> for CommentReport {
    fn from(sql: SqlReport) -> Self {
        CommentReport {
            id: sql.id,
            comment_id: sql.comment_id,
            skill_id: sql.skill_id,
            reporter_id: sql.reporter_id,
            reason: sql.reason,
            created_at: sql.created_at,
        }
    }
}

#[derive(FromRow)]
pub struct SqlAccount {
    pub id: String,
    pub role: String,
    pub created_at: NaiveDateTime,
    pub deactivated_at: Option<NaiveDateTime>,
}

impl From<SqlAccount> for Account {
    fn from(sql: SqlAccount) -> Self {
        Account {
            id: sql.id,
            role: Role::parse(&sql.role).unwrap_or(Role::User),
            created_at: sql.created_at,
            deactivated_at: sql.deactivated_at,
        }
    }
}

#[derive(FromRow)]
pub struct SqlSkill {
    pub id: String,
    pub slug: String,
    pub owner_id: String,
    pub created_at: NaiveDateTime,
}

impl From<SqlSkill> for Skill {
    fn from(sql: SqlSkill) -> Self {
        Skill {
            id: sql.id,
            slug: SkillSlug::new_unchecked(sql.slug),
            owner_id: sql.owner_id,
            created_at: sql.created_at,
        }
    }
}

#[derive(FromRow)]
pub struct SqlSkillVersion {
    pub id: String,
    pub skill_id: String,
    pub version: i64,
    pub document_ref: String,
    pub fingerprint: String,
    pub assessment_json: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<SqlSkillVersion> for SkillVersion {
    fn from(sql: SqlSkillVersion) -> Self {
        SkillVersion {
            id: sql.id,
            skill_id: sql.skill_id,
            version: sql.version,
            document_ref: sql.document_ref,
            fingerprint: sql.fingerprint,
            assessment: sql
                .assessment_json
                .as_deref()
                .and_then(|j| serde_json::from_str(j).ok()),
            created_at: sql.created_at,
        }
    }
}

#[derive(FromRow)]
pub struct SqlAuditLog {
    pub actor_id: String,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub metadata: String,
    pub created_at: NaiveDateTime,
}

impl From<SqlAuditLog> for AuditLogEntry {
    fn from(sql: SqlAuditLog) -> Self {
        AuditLogEntry {
            actor_id: sql.actor_id,
            action: sql.action,
            target_type: sql.target_type,
            target_id: sql.target_id,
            metadata: serde_json::from_str(&sql.metadata)
                .unwrap_or(serde_json::Value::Null),
            created_at: sql.created_at,
        }
    }
}

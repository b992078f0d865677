use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::{fs, path::Path};
mod models;
mod repo;

pub use repo::reports::ReportTxOutcome;
pub use repo::skills::ActivityItem;

#[derive(Clone)]
pub struct Db {
    pub(crate) pool: Pool<Sqlite>,
}

impl Db {
    pub async fn new(db_url: &str) -> anyhow::Result<Self> {
        if db_url.starts_with("sqlite://") && !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite://");
            let path = Path::new(path_str);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
            }
        }
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            Sqlite::create_database(db_url).await?;
        }
        // 内存库按连接隔离，必须钉死在单连接上
        let mut opts = SqlitePoolOptions::new();
        if db_url.contains(":memory:") {
            opts = opts.max_connections(1).idle_timeout(None).max_lifetime(None);
        }
        let pool = opts.connect(db_url).await?;
        sqlx::query("PRAGMA journal_mode = WAL;")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA synchronous = NORMAL;")
            .execute(&pool)
            .await?;
        sqlx::migrate!("../../migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use domain::{
        AuditLogEntry, Comment, CommentReport, ModerationState, ModerationStatus, Skill,
        SkillSlug, SkillVersion,
    };

    fn now() -> NaiveDateTime {
        chrono::Utc::now().naive_utc()
    }

    fn audit(action: &str, target_id: &str) -> AuditLogEntry {
        AuditLogEntry {
            actor_id: "tester".into(),
            action: action.into(),
            target_type: "comment".into(),
            target_id: target_id.into(),
            metadata: serde_json::json!({}),
            created_at: now(),
        }
    }

    fn comment(id: &str) -> Comment {
        Comment {
            id: id.into(),
            skill_id: "sk1".into(),
            author_id: "author".into(),
            body: "a perfectly normal comment".into(),
            created_at: now(),
            moderation_status: ModerationStatus::Active,
            moderation_reason: None,
            moderation_notes: None,
            report_count: 0,
            last_reported_at: None,
            hidden_at: None,
            deleted_by: None,
            last_reviewed_at: None,
        }
    }

    fn report(comment_id: &str, reporter_id: &str) -> CommentReport {
        CommentReport {
            id: format!("r-{}-{}", comment_id, reporter_id),
            comment_id: comment_id.into(),
            skill_id: "sk1".into(),
            reporter_id: reporter_id.into(),
            reason: "spam".into(),
            created_at: now(),
        }
    }

    async fn test_db() -> Db {
        let db = Db::new("sqlite::memory:").await.unwrap();
        let skill = Skill {
            id: "sk1".into(),
            slug: SkillSlug::new_unchecked("test-skill".into()),
            owner_id: "owner".into(),
            created_at: now(),
        };
        let version = SkillVersion {
            id: "v1".into(),
            skill_id: "sk1".into(),
            version: 1,
            document_ref: "docs/test-skill.md".into(),
            fingerprint: "h1:s".into(),
            assessment: None,
            created_at: now(),
        };
        db.create_skill_with_version(&skill, &version).await.unwrap();
        db.insert_comment(&comment("c1"), &audit("comment.add", "c1"))
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn duplicate_report_is_idempotent() {
        let db = test_db().await;
        let r = report("c1", "u1");
        let first = db
            .file_report(&r, 3, now(), &audit("comment.report", "c1"), &audit("comment.auto_hide", "c1"))
            .await
            .unwrap();
        assert!(matches!(first, ReportTxOutcome::Filed { new_count: 1, auto_hidden: false }));

        let second = db
            .file_report(&r, 3, now(), &audit("comment.report", "c1"), &audit("comment.auto_hide", "c1"))
            .await
            .unwrap();
        assert!(matches!(second, ReportTxOutcome::AlreadyReported));

        // 零额外写入
        let c = db.get_comment("c1").await.unwrap().unwrap();
        assert_eq!(c.report_count, 1);
        let logs = db.list_audit_for_target("comment", "c1").await.unwrap();
        assert_eq!(logs.iter().filter(|l| l.action == "comment.report").count(), 1);
    }

    #[tokio::test]
    async fn auto_hide_fires_exactly_once_on_fourth_report() {
        let db = test_db().await;
        for i in 1..=3 {
            let out = db
                .file_report(
                    &report("c1", &format!("u{}", i)),
                    3,
                    now(),
                    &audit("comment.report", "c1"),
                    &audit("comment.auto_hide", "c1"),
                )
                .await
                .unwrap();
            assert!(matches!(out, ReportTxOutcome::Filed { auto_hidden: false, .. }));
        }

        let fourth = db
            .file_report(
                &report("c1", "u4"),
                3,
                now(),
                &audit("comment.report", "c1"),
                &audit("comment.auto_hide", "c1"),
            )
            .await
            .unwrap();
        assert!(matches!(fourth, ReportTxOutcome::Filed { new_count: 4, auto_hidden: true }));

        let c = db.get_comment("c1").await.unwrap().unwrap();
        assert_eq!(c.moderation_status, ModerationStatus::Hidden);
        assert_eq!(c.moderation_reason.as_deref(), Some("auto.reports"));
        assert!(c.hidden_at.is_some());

        // 第 5 条举报落在已隐藏的评论上，不再触发
        let fifth = db
            .file_report(
                &report("c1", "u5"),
                3,
                now(),
                &audit("comment.report", "c1"),
                &audit("comment.auto_hide", "c1"),
            )
            .await
            .unwrap();
        assert!(matches!(fifth, ReportTxOutcome::Filed { new_count: 5, auto_hidden: false }));
        let logs = db.list_audit_for_target("comment", "c1").await.unwrap();
        assert_eq!(logs.iter().filter(|l| l.action == "comment.auto_hide").count(), 1);
    }

    #[tokio::test]
    async fn apply_moderation_is_conditional() {
        let db = test_db().await;
        let hidden = ModerationState {
            status: ModerationStatus::Hidden,
            reason: Some("mod.manual".into()),
            notes: None,
            hidden_at: Some(now()),
            deleted_by: None,
            last_reviewed_at: None,
        };
        let taken = db
            .apply_moderation("c1", "active", &hidden, &audit("comment.hide", "c1"))
            .await
            .unwrap();
        assert!(taken);

        // 旧状态不匹配：0 行生效，审计也不写
        let again = db
            .apply_moderation("c1", "active", &hidden, &audit("comment.hide", "c1"))
            .await
            .unwrap();
        assert!(!again);
        let logs = db.list_audit_for_target("comment", "c1").await.unwrap();
        assert_eq!(logs.iter().filter(|l| l.action == "comment.hide").count(), 1);
    }

    #[tokio::test]
    async fn hard_delete_purges_reports() {
        let db = test_db().await;
        for i in 1..=2 {
            db.file_report(
                &report("c1", &format!("u{}", i)),
                3,
                now(),
                &audit("comment.report", "c1"),
                &audit("comment.auto_hide", "c1"),
            )
            .await
            .unwrap();
        }
        db.hard_delete_comment("c1", &audit("comment.hard_delete", "c1"))
            .await
            .unwrap();
        assert!(db.get_comment("c1").await.unwrap().is_none());
        assert!(db.find_report("c1", "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn open_report_targets_track_visibility() {
        let db = test_db().await;
        db.insert_comment(&comment("c2"), &audit("comment.add", "c2"))
            .await
            .unwrap();
        for c in ["c1", "c2"] {
            db.file_report(
                &report(c, "u1"),
                3,
                now(),
                &audit("comment.report", c),
                &audit("comment.auto_hide", c),
            )
            .await
            .unwrap();
        }
        assert_eq!(db.list_open_report_targets("u1").await.unwrap().len(), 2);

        // c1 隐藏后不再计入
        let hidden = ModerationState {
            status: ModerationStatus::Hidden,
            reason: Some("mod.manual".into()),
            notes: None,
            hidden_at: Some(now()),
            deleted_by: None,
            last_reviewed_at: None,
        };
        db.apply_moderation("c1", "active", &hidden, &audit("comment.hide", "c1"))
            .await
            .unwrap();
        assert_eq!(db.list_open_report_targets("u1").await.unwrap().len(), 1);
    }
}

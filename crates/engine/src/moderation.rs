use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use domain::{
    assert_admin, assert_moderator, Actor, AuditLogEntry, Comment, CoreError, ModerationEvent,
    ModerationState, ModerationStatus, StatEvent, StatKind,
};
use storage::{Db, ReportTxOutcome};
use tokio::sync::broadcast;
use tracing::info;

use crate::new_id;
use crate::traits::{AccountDirectory, StatSink};

// 第 4 条独立举报触发自动隐藏
const AUTO_HIDE_THRESHOLD: i64 = 3;
// 单个举报人名下"仍然有效"的举报上限
const OPEN_REPORT_CAP: usize = 20;
const REASON_MAX_CHARS: usize = 500;

const TARGET_COMMENT: &str = "comment";
const SYSTEM_ACTOR: &str = "system";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOutcome {
    pub reported: bool,
    pub already_reported: bool,
    pub auto_hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationOutcome {
    // false 表示无操作请求：零写入、零事件
    pub changed: bool,
}

pub struct ModerationEngine {
    db: Db,
    accounts: Arc<dyn AccountDirectory>,
    stats: Arc<dyn StatSink>,
    tx_events: broadcast::Sender<ModerationEvent>,
}

impl ModerationEngine {
    pub fn new(
        db: Db,
        accounts: Arc<dyn AccountDirectory>,
        stats: Arc<dyn StatSink>,
        tx_events: broadcast::Sender<ModerationEvent>,
    ) -> Self {
        Self {
            db,
            accounts,
            stats,
            tx_events,
        }
    }

    pub async fn add_comment(
        &self,
        actor: &Actor,
        skill_slug: &str,
        body: &str,
    ) -> Result<Comment, CoreError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(CoreError::validation("comment body is empty"));
        }
        let skill = self
            .db
            .get_skill_by_slug(skill_slug)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("skill: {}", skill_slug)))?;

        let now = Utc::now().naive_utc();
        let comment = Comment {
            id: new_id(),
            skill_id: skill.id.clone(),
            author_id: actor.id.clone(),
            body: body.to_string(),
            created_at: now,
            moderation_status: ModerationStatus::Active,
            moderation_reason: None,
            moderation_notes: None,
            report_count: 0,
            last_reported_at: None,
            hidden_at: None,
            deleted_by: None,
            last_reviewed_at: None,
        };
        let entry = audit(
            &actor.id,
            "comment.add",
            &comment.id,
            serde_json::json!({ "skill_id": skill.id }),
            now,
        );
        self.db.insert_comment(&comment, &entry).await?;

        self.emit_stat(&skill.id, StatKind::Comment).await;
        let _ = self.tx_events.send(ModerationEvent::CommentAdded {
            skill_slug: skill.slug.to_string(),
            comment: comment.clone(),
        });
        Ok(comment)
    }

    pub async fn list_comments(&self, skill_slug: &str) -> Result<Vec<Comment>, CoreError> {
        let skill = self
            .db
            .get_skill_by_slug(skill_slug)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("skill: {}", skill_slug)))?;
        Ok(self.db.list_visible_comments(&skill.id).await?)
    }

    pub async fn report(
        &self,
        actor: &Actor,
        comment_id: &str,
        reason: &str,
    ) -> Result<ReportOutcome, CoreError> {
        // 校验先于任何读取
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(CoreError::validation("report reason is empty"));
        }

        let comment = self
            .db
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("comment: {}", comment_id)))?;
        if comment.moderation_status == ModerationStatus::Removed || comment.deleted_by.is_some() {
            return Err(CoreError::not_found(format!("comment: {}", comment_id)));
        }
        if comment.moderation_status == ModerationStatus::Hidden {
            return Err(CoreError::validation("comment is already hidden"));
        }

        // 幂等：已有同对举报直接返回成功，不做任何写入
        if self
            .db
            .find_report(comment_id, &actor.id)
            .await?
            .is_some()
        {
            return Ok(ReportOutcome {
                reported: false,
                already_reported: true,
                auto_hidden: false,
            });
        }

        self.enforce_report_cap(&actor.id).await?;

        let now = Utc::now().naive_utc();
        let report = domain::CommentReport {
            id: new_id(),
            comment_id: comment_id.to_string(),
            skill_id: comment.skill_id.clone(),
            reporter_id: actor.id.clone(),
            reason: reason.chars().take(REASON_MAX_CHARS).collect(),
            created_at: now,
        };
        let report_audit = audit(
            &actor.id,
            "comment.report",
            comment_id,
            serde_json::json!({ "reason": report.reason }),
            now,
        );
        let auto_hide_audit = audit(
            SYSTEM_ACTOR,
            "comment.auto_hide",
            comment_id,
            serde_json::json!({ "threshold": AUTO_HIDE_THRESHOLD }),
            now,
        );

        let outcome = self
            .db
            .file_report(&report, AUTO_HIDE_THRESHOLD, now, &report_audit, &auto_hide_audit)
            .await?;

        match outcome {
            // 竞态输家等同"已举报"，不是错误
            ReportTxOutcome::AlreadyReported => Ok(ReportOutcome {
                reported: false,
                already_reported: true,
                auto_hidden: false,
            }),
            ReportTxOutcome::Filed { new_count, auto_hidden } => {
                if auto_hidden {
                    info!(
                        "Comment {} auto-hidden after {} unique reports",
                        comment_id, new_count
                    );
                    self.emit_stat(&comment.skill_id, StatKind::Uncomment).await;
                    self.broadcast(&comment.skill_id, |slug| ModerationEvent::CommentHidden {
                        skill_slug: slug,
                        comment_id: comment_id.to_string(),
                    })
                    .await;
                }
                Ok(ReportOutcome {
                    reported: true,
                    already_reported: false,
                    auto_hidden,
                })
            }
        }
    }

    // 有效举报：目标评论仍可见，且其作者未被停用
    async fn enforce_report_cap(&self, reporter_id: &str) -> Result<(), CoreError> {
        let targets = self.db.list_open_report_targets(reporter_id).await?;
        if targets.len() < OPEN_REPORT_CAP {
            return Ok(());
        }
        let mut active_cache: HashMap<String, bool> = HashMap::new();
        let mut open = 0usize;
        for author_id in &targets {
            let active = match active_cache.get(author_id) {
                Some(v) => *v,
                None => {
                    let v = self
                        .accounts
                        .get_account(author_id)
                        .await?
                        .map(|a| !a.is_deactivated())
                        .unwrap_or(false);
                    active_cache.insert(author_id.clone(), v);
                    v
                }
            };
            if active {
                open += 1;
            }
        }
        if open >= OPEN_REPORT_CAP {
            return Err(CoreError::RateLimit(format!(
                "reporter {} has {} open reports (cap {})",
                reporter_id, open, OPEN_REPORT_CAP
            )));
        }
        Ok(())
    }

    pub async fn hide(
        &self,
        actor: &Actor,
        comment_id: &str,
        reason: Option<String>,
        notes: Option<String>,
    ) -> Result<ModerationOutcome, CoreError> {
        assert_moderator(actor)?;
        let comment = self.require_comment(comment_id).await?;
        if comment.moderation_status != ModerationStatus::Active {
            // 已隐藏/已移除：无操作
            return Ok(ModerationOutcome { changed: false });
        }

        let now = Utc::now().naive_utc();
        let was_visible = comment.is_visible();
        let state = ModerationState {
            status: ModerationStatus::Hidden,
            reason: Some(reason.unwrap_or_else(|| "moderator.hide".into())),
            notes,
            hidden_at: Some(now),
            deleted_by: comment.deleted_by.clone(),
            last_reviewed_at: Some(now),
        };
        let entry = audit(&actor.id, "comment.hide", comment_id, serde_json::json!({}), now);
        let taken = self
            .db
            .apply_moderation(comment_id, ModerationStatus::Active.as_str(), &state, &entry)
            .await?;
        if taken && was_visible {
            self.emit_stat(&comment.skill_id, StatKind::Uncomment).await;
            self.broadcast(&comment.skill_id, |slug| ModerationEvent::CommentHidden {
                skill_slug: slug,
                comment_id: comment_id.to_string(),
            })
            .await;
        }
        Ok(ModerationOutcome { changed: taken })
    }

    pub async fn restore(
        &self,
        actor: &Actor,
        comment_id: &str,
    ) -> Result<ModerationOutcome, CoreError> {
        assert_moderator(actor)?;
        let comment = self.require_comment(comment_id).await?;
        match comment.moderation_status {
            ModerationStatus::Active => return Ok(ModerationOutcome { changed: false }),
            ModerationStatus::Removed => {
                return Err(CoreError::validation("cannot restore a removed comment"))
            }
            ModerationStatus::Hidden => {}
        }

        let now = Utc::now().naive_utc();
        let state = ModerationState {
            status: ModerationStatus::Active,
            reason: None,
            notes: comment.moderation_notes.clone(),
            hidden_at: None,
            deleted_by: comment.deleted_by.clone(),
            last_reviewed_at: Some(now),
        };
        let entry = audit(&actor.id, "comment.restore", comment_id, serde_json::json!({}), now);
        let taken = self
            .db
            .apply_moderation(comment_id, ModerationStatus::Hidden.as_str(), &state, &entry)
            .await?;
        if taken && comment.deleted_by.is_none() {
            // 恢复可见
            self.emit_stat(&comment.skill_id, StatKind::Comment).await;
            self.broadcast(&comment.skill_id, |slug| ModerationEvent::CommentRestored {
                skill_slug: slug,
                comment_id: comment_id.to_string(),
            })
            .await;
        }
        Ok(ModerationOutcome { changed: taken })
    }

    // 作者自删或版主删除；removed 为终态
    pub async fn remove(
        &self,
        actor: &Actor,
        comment_id: &str,
    ) -> Result<ModerationOutcome, CoreError> {
        let comment = self.require_comment(comment_id).await?;
        let self_delete = actor.id == comment.author_id;
        if !self_delete {
            assert_moderator(actor)?;
        }
        if comment.moderation_status == ModerationStatus::Removed {
            return Ok(ModerationOutcome { changed: false });
        }

        let now = Utc::now().naive_utc();
        let was_visible = comment.is_visible();
        let state = ModerationState {
            status: ModerationStatus::Removed,
            reason: comment.moderation_reason.clone(),
            notes: comment.moderation_notes.clone(),
            hidden_at: comment.hidden_at,
            deleted_by: Some(actor.id.clone()),
            last_reviewed_at: comment.last_reviewed_at,
        };
        let entry = audit(
            &actor.id,
            "comment.delete",
            comment_id,
            serde_json::json!({ "self_delete": self_delete }),
            now,
        );
        let taken = self
            .db
            .apply_moderation(
                comment_id,
                comment.moderation_status.as_str(),
                &state,
                &entry,
            )
            .await?;
        if taken && was_visible {
            self.emit_stat(&comment.skill_id, StatKind::Uncomment).await;
            self.broadcast(&comment.skill_id, |slug| ModerationEvent::CommentRemoved {
                skill_slug: slug,
                comment_id: comment_id.to_string(),
            })
            .await;
        }
        Ok(ModerationOutcome { changed: taken })
    }

    // 管理员专属的破坏性操作：连举报一起清除
    pub async fn hard_delete(
        &self,
        actor: &Actor,
        comment_id: &str,
    ) -> Result<(), CoreError> {
        assert_admin(actor)?;
        let comment = self.require_comment(comment_id).await?;
        let now = Utc::now().naive_utc();
        let entry = audit(
            &actor.id,
            "comment.hard_delete",
            comment_id,
            serde_json::json!({ "report_count": comment.report_count }),
            now,
        );
        let was_visible = comment.is_visible();
        self.db.hard_delete_comment(comment_id, &entry).await?;
        if was_visible {
            self.emit_stat(&comment.skill_id, StatKind::Uncomment).await;
            self.broadcast(&comment.skill_id, |slug| ModerationEvent::CommentRemoved {
                skill_slug: slug,
                comment_id: comment_id.to_string(),
            })
            .await;
        }
        Ok(())
    }

    pub async fn audit_trail(
        &self,
        actor: &Actor,
        comment_id: &str,
    ) -> Result<Vec<AuditLogEntry>, CoreError> {
        assert_moderator(actor)?;
        Ok(self
            .db
            .list_audit_for_target(TARGET_COMMENT, comment_id)
            .await?)
    }

    async fn require_comment(&self, comment_id: &str) -> Result<Comment, CoreError> {
        self.db
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("comment: {}", comment_id)))
    }

    async fn emit_stat(&self, skill_id: &str, kind: StatKind) {
        self.stats
            .emit(StatEvent {
                skill_id: skill_id.to_string(),
                kind,
            })
            .await;
    }

    async fn broadcast<F>(&self, skill_id: &str, build: F)
    where
        F: FnOnce(String) -> ModerationEvent,
    {
        // SSE 订阅端按 slug 过滤，这里补一次 slug 反查
        if let Ok(Some(skill)) = self.db.get_skill_by_id(skill_id).await {
            let _ = self.tx_events.send(build(skill.slug.to_string()));
        }
    }
}

fn audit(
    actor_id: &str,
    action: &str,
    target_id: &str,
    metadata: serde_json::Value,
    created_at: NaiveDateTime,
) -> AuditLogEntry {
    AuditLogEntry {
        actor_id: actor_id.to_string(),
        action: action.to_string(),
        target_type: TARGET_COMMENT.to_string(),
        target_id: target_id.to_string(),
        metadata,
        created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use domain::{Account, Role, Skill, SkillSlug, SkillVersion};
    use std::sync::Mutex;

    struct MutableDirectory(Mutex<HashMap<String, Account>>);

    impl MutableDirectory {
        fn with(accounts: &[(&str, Role)]) -> Arc<Self> {
            let map = accounts
                .iter()
                .map(|(id, role)| {
                    (
                        id.to_string(),
                        Account {
                            id: id.to_string(),
                            role: *role,
                            created_at: Utc::now().naive_utc(),
                            deactivated_at: None,
                        },
                    )
                })
                .collect();
            Arc::new(Self(Mutex::new(map)))
        }

        fn deactivate(&self, id: &str) {
            if let Some(a) = self.0.lock().unwrap().get_mut(id) {
                a.deactivated_at = Some(Utc::now().naive_utc());
            }
        }
    }

    #[async_trait]
    impl AccountDirectory for MutableDirectory {
        async fn get_account(&self, id: &str) -> Result<Option<Account>> {
            Ok(self.0.lock().unwrap().get(id).cloned())
        }
    }

    #[derive(Default)]
    struct RecordingStats(Mutex<Vec<StatEvent>>);

    #[async_trait]
    impl StatSink for RecordingStats {
        async fn emit(&self, event: StatEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    impl RecordingStats {
        fn count(&self, kind: StatKind) -> usize {
            self.0.lock().unwrap().iter().filter(|e| e.kind == kind).count()
        }
    }

    fn actor(id: &str, role: Role) -> Actor {
        Actor {
            id: id.into(),
            role,
        }
    }

    struct Fixture {
        engine: ModerationEngine,
        db: Db,
        directory: Arc<MutableDirectory>,
        stats: Arc<RecordingStats>,
    }

    async fn fixture(accounts: &[(&str, Role)]) -> Fixture {
        let db = Db::new("sqlite::memory:").await.unwrap();
        let now = Utc::now().naive_utc();
        let skill = Skill {
            id: "sk1".into(),
            slug: SkillSlug::new_unchecked("release-notes".into()),
            owner_id: "owner".into(),
            created_at: now,
        };
        let version = SkillVersion {
            id: "v1".into(),
            skill_id: "sk1".into(),
            version: 1,
            document_ref: "docs/release-notes.md".into(),
            fingerprint: "h1:s".into(),
            assessment: None,
            created_at: now,
        };
        db.create_skill_with_version(&skill, &version).await.unwrap();

        let directory = MutableDirectory::with(accounts);
        let stats = Arc::new(RecordingStats::default());
        let (tx, _rx) = broadcast::channel(16);
        let engine = ModerationEngine::new(db.clone(), directory.clone(), stats.clone(), tx);
        Fixture {
            engine,
            db,
            directory,
            stats,
        }
    }

    #[tokio::test]
    async fn report_validation_runs_before_lookup() {
        let f = fixture(&[("rita", Role::User)]).await;
        let err = f
            .engine
            .report(&actor("rita", Role::User), "nope", "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = f
            .engine
            .report(&actor("rita", Role::User), "nope", "spam")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn report_is_idempotent_per_reporter() {
        let f = fixture(&[("bob", Role::User), ("rita", Role::User)]).await;
        let c = f
            .engine
            .add_comment(&actor("bob", Role::User), "release-notes", "nice skill")
            .await
            .unwrap();

        let first = f
            .engine
            .report(&actor("rita", Role::User), &c.id, "spam")
            .await
            .unwrap();
        assert!(first.reported && !first.already_reported);

        for _ in 0..3 {
            let again = f
                .engine
                .report(&actor("rita", Role::User), &c.id, "spam again")
                .await
                .unwrap();
            assert_eq!(
                again,
                ReportOutcome {
                    reported: false,
                    already_reported: true,
                    auto_hidden: false
                }
            );
        }
        let stored = f.db.get_comment(&c.id).await.unwrap().unwrap();
        assert_eq!(stored.report_count, 1);
    }

    #[tokio::test]
    async fn fourth_unique_report_auto_hides_once() {
        let f = fixture(&[
            ("bob", Role::User),
            ("u1", Role::User),
            ("u2", Role::User),
            ("u3", Role::User),
            ("u4", Role::User),
            ("u5", Role::User),
        ])
        .await;
        let c = f
            .engine
            .add_comment(&actor("bob", Role::User), "release-notes", "contested take")
            .await
            .unwrap();

        for u in ["u1", "u2", "u3"] {
            let out = f.engine.report(&actor(u, Role::User), &c.id, "abuse").await.unwrap();
            assert!(!out.auto_hidden);
        }
        let fourth = f
            .engine
            .report(&actor("u4", Role::User), &c.id, "abuse")
            .await
            .unwrap();
        assert!(fourth.auto_hidden);

        let stored = f.db.get_comment(&c.id).await.unwrap().unwrap();
        assert_eq!(stored.moderation_status, ModerationStatus::Hidden);
        assert_eq!(stored.moderation_reason.as_deref(), Some("auto.reports"));
        assert_eq!(f.stats.count(StatKind::Uncomment), 1);

        // 已隐藏的评论拒绝后续举报
        let err = f
            .engine
            .report(&actor("u5", Role::User), &c.id, "abuse")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn report_cap_excludes_deactivated_authors() {
        let mut accounts = vec![("bob", Role::User), ("rita", Role::User)];
        let extra = "spammer";
        accounts.push((extra, Role::User));
        let f = fixture(&accounts).await;

        // rita 攒满 20 条仍然有效的举报
        let mut last_target = String::new();
        for i in 0..21 {
            let author = if i < 20 { "bob" } else { extra };
            let c = f
                .engine
                .add_comment(&actor(author, Role::User), "release-notes", &format!("comment {}", i))
                .await
                .unwrap();
            last_target = c.id.clone();
            if i < 20 {
                f.engine
                    .report(&actor("rita", Role::User), &c.id, "spam")
                    .await
                    .unwrap();
            }
        }

        let err = f
            .engine
            .report(&actor("rita", Role::User), &last_target, "spam")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::RateLimit(_)));

        // 目标作者被停用后，那些举报不再占名额
        f.directory.deactivate("bob");
        let ok = f
            .engine
            .report(&actor("rita", Role::User), &last_target, "spam")
            .await
            .unwrap();
        assert!(ok.reported);
    }

    #[tokio::test]
    async fn self_delete_requires_authorship() {
        let f = fixture(&[("bob", Role::User), ("eve", Role::User)]).await;
        let c = f
            .engine
            .add_comment(&actor("bob", Role::User), "release-notes", "my own words")
            .await
            .unwrap();

        // 非作者的普通用户：权限错误，零写入
        let err = f
            .engine
            .remove(&actor("eve", Role::User), &c.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Permission(_)));
        let stored = f.db.get_comment(&c.id).await.unwrap().unwrap();
        assert_eq!(stored.moderation_status, ModerationStatus::Active);

        // 作者本人自删无需版主身份
        let out = f.engine.remove(&actor("bob", Role::User), &c.id).await.unwrap();
        assert!(out.changed);
        let stored = f.db.get_comment(&c.id).await.unwrap().unwrap();
        assert_eq!(stored.moderation_status, ModerationStatus::Removed);
        assert_eq!(stored.deleted_by.as_deref(), Some("bob"));

        // 重复删除是无操作
        let again = f.engine.remove(&actor("bob", Role::User), &c.id).await.unwrap();
        assert!(!again.changed);
        assert_eq!(f.stats.count(StatKind::Uncomment), 1);
    }

    #[tokio::test]
    async fn hide_restore_round_trip() {
        let f = fixture(&[("bob", Role::User), ("mo", Role::Moderator)]).await;
        let c = f
            .engine
            .add_comment(&actor("bob", Role::User), "release-notes", "borderline")
            .await
            .unwrap();

        let hidden = f
            .engine
            .hide(&actor("mo", Role::Moderator), &c.id, None, Some("queued".into()))
            .await
            .unwrap();
        assert!(hidden.changed);

        // 对已隐藏的评论再 hide 是无操作
        let again = f
            .engine
            .hide(&actor("mo", Role::Moderator), &c.id, None, None)
            .await
            .unwrap();
        assert!(!again.changed);

        let restored = f
            .engine
            .restore(&actor("mo", Role::Moderator), &c.id)
            .await
            .unwrap();
        assert!(restored.changed);
        let stored = f.db.get_comment(&c.id).await.unwrap().unwrap();
        assert_eq!(stored.moderation_status, ModerationStatus::Active);
        assert!(stored.hidden_at.is_none());
        assert!(stored.moderation_reason.is_none());
        assert!(stored.last_reviewed_at.is_some());

        // 恢复已激活的评论也是无操作
        let noop = f
            .engine
            .restore(&actor("mo", Role::Moderator), &c.id)
            .await
            .unwrap();
        assert!(!noop.changed);
        assert_eq!(f.stats.count(StatKind::Comment), 2); // add + restore
        assert_eq!(f.stats.count(StatKind::Uncomment), 1); // hide
    }

    #[tokio::test]
    async fn hard_delete_is_admin_only_and_purges() {
        let f = fixture(&[
            ("bob", Role::User),
            ("rita", Role::User),
            ("mo", Role::Moderator),
            ("root", Role::Admin),
        ])
        .await;
        let c = f
            .engine
            .add_comment(&actor("bob", Role::User), "release-notes", "to be purged")
            .await
            .unwrap();
        f.engine
            .report(&actor("rita", Role::User), &c.id, "bad")
            .await
            .unwrap();

        let err = f
            .engine
            .hard_delete(&actor("mo", Role::Moderator), &c.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Permission(_)));

        f.engine
            .hard_delete(&actor("root", Role::Admin), &c.id)
            .await
            .unwrap();
        assert!(f.db.get_comment(&c.id).await.unwrap().is_none());
        assert!(f.db.find_report(&c.id, "rita").await.unwrap().is_none());
        assert_eq!(f.stats.count(StatKind::Uncomment), 1);
    }
}

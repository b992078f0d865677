use crate::{models::SqlReport, repo::audit, Db};
use chrono::NaiveDateTime;
use domain::{AuditLogEntry, CommentReport};
use sqlx::Row;

#[derive(Debug)]
pub enum ReportTxOutcome {
    // 同一 (comment, reporter) 已有记录：幂等成功，零写入
    AlreadyReported,
    Filed { new_count: i64, auto_hidden: bool },
}

impl Db {
    pub async fn find_report(
        &self,
        comment_id: &str,
        reporter_id: &str,
    ) -> anyhow::Result<Option<CommentReport>> {
        let row = sqlx::query_as::<_, SqlReport>(
            "SELECT id, comment_id, skill_id, reporter_id, reason, created_at \
             FROM comment_reports WHERE comment_id = ? AND reporter_id = ?",
        )
        .bind(comment_id)
        .bind(reporter_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    // 举报人名下仍然有效的举报：目标评论可见即算，返回各目标作者 ID。
    // 作者是否已停用由调用方通过账号目录过滤。
    pub async fn list_open_report_targets(
        &self,
        reporter_id: &str,
    ) -> anyhow::Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT c.author_id
            FROM comment_reports r
            JOIN comments c ON c.id = r.comment_id
            WHERE r.reporter_id = ?
              AND c.moderation_status = 'active'
              AND c.deleted_by IS NULL
            "#,
        )
        .bind(reporter_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.get::<String, _>(0)).collect())
    }

    // 举报处理的原子单元：查重、插入、计数 +1、盖时间戳，
    // 以及（条件满足时）自动隐藏 + 其审计行——同一事务内完成。
    // hide_threshold 为触发前的计数上限：new_count 首次超过它才隐藏。
    pub async fn file_report(
        &self,
        report: &CommentReport,
        hide_threshold: i64,
        hidden_at: NaiveDateTime,
        report_audit: &AuditLogEntry,
        auto_hide_audit: &AuditLogEntry,
    ) -> anyhow::Result<ReportTxOutcome> {
        let mut tx = self.pool.begin().await?;

        // 事务内复查，竞态输家走幂等分支
        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM comment_reports WHERE comment_id = ? AND reporter_id = ?",
        )
        .bind(&report.comment_id)
        .bind(&report.reporter_id)
        .fetch_optional(&mut *tx)
        .await?;
        if existing.is_some() {
            tx.rollback().await?;
            return Ok(ReportTxOutcome::AlreadyReported);
        }

        let insert = sqlx::query(
            r#"
            INSERT INTO comment_reports (id, comment_id, skill_id, reporter_id, reason, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&report.id)
        .bind(&report.comment_id)
        .bind(&report.skill_id)
        .bind(&report.reporter_id)
        .bind(&report.reason)
        .bind(report.created_at)
        .execute(&mut *tx)
        .await;

        if let Err(e) = insert {
            // 唯一索引兜底：撞上约束的也是"已举报"，不是失败
            let unique = e
                .as_database_error()
                .map(|d| d.is_unique_violation())
                .unwrap_or(false);
            tx.rollback().await?;
            if unique {
                tracing::debug!(
                    "Unique index absorbed concurrent duplicate report on {}",
                    report.comment_id
                );
                return Ok(ReportTxOutcome::AlreadyReported);
            }
            return Err(e.into());
        }

        let row = sqlx::query(
            "SELECT report_count, moderation_status, deleted_by FROM comments WHERE id = ?",
        )
        .bind(&report.comment_id)
        .fetch_one(&mut *tx)
        .await?;
        let prior_count: i64 = row.get(0);
        let status: String = row.get(1);
        let deleted_by: Option<String> = row.get(2);
        let was_visible = status == "active" && deleted_by.is_none();

        let new_count = prior_count + 1;
        sqlx::query("UPDATE comments SET report_count = ?, last_reported_at = ? WHERE id = ?")
            .bind(new_count)
            .bind(report.created_at)
            .bind(&report.comment_id)
            .execute(&mut *tx)
            .await?;

        let auto_hidden = new_count > hide_threshold && was_visible;
        if auto_hidden {
            sqlx::query(
                r#"
                UPDATE comments SET
                    moderation_status = 'hidden',
                    moderation_reason = 'auto.reports',
                    hidden_at = ?
                WHERE id = ?
                "#,
            )
            .bind(hidden_at)
            .bind(&report.comment_id)
            .execute(&mut *tx)
            .await?;
            audit::append_tx(&mut tx, auto_hide_audit).await?;
        }

        audit::append_tx(&mut tx, report_audit).await?;
        tx.commit().await?;
        Ok(ReportTxOutcome::Filed {
            new_count,
            auto_hidden,
        })
    }
}

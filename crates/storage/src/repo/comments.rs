use crate::{models::SqlComment, repo::audit, Db};
use domain::{AuditLogEntry, Comment, ModerationState};

const COMMENT_COLUMNS: &str = "id, skill_id, author_id, body, created_at, moderation_status, \
     moderation_reason, moderation_notes, report_count, last_reported_at, hidden_at, \
     deleted_by, last_reviewed_at";

impl Db {
    pub async fn insert_comment(
        &self,
        comment: &Comment,
        audit_entry: &AuditLogEntry,
    ) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO comments
                (id, skill_id, author_id, body, created_at, moderation_status, report_count)
            VALUES (?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.skill_id)
        .bind(&comment.author_id)
        .bind(&comment.body)
        .bind(comment.created_at)
        .bind(comment.moderation_status.as_str())
        .execute(&mut *tx)
        .await?;
        audit::append_tx(&mut tx, audit_entry).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn get_comment(&self, id: &str) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, SqlComment>(&format!(
            "SELECT {} FROM comments WHERE id = ?",
            COMMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    pub async fn list_visible_comments(&self, skill_id: &str) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, SqlComment>(&format!(
            "SELECT {} FROM comments \
             WHERE skill_id = ? AND moderation_status = 'active' AND deleted_by IS NULL \
             ORDER BY created_at ASC",
            COMMENT_COLUMNS
        ))
        .bind(skill_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    // 条件式整体替换：WHERE 钉住旧状态，竞态输家会看到 0 行生效。
    // 审计行只在替换真正发生时写入，保证"无操作零写入"。
    pub async fn apply_moderation(
        &self,
        comment_id: &str,
        expected_status: &str,
        new_state: &ModerationState,
        audit_entry: &AuditLogEntry,
    ) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE comments SET
                moderation_status = ?,
                moderation_reason = ?,
                moderation_notes = ?,
                hidden_at = ?,
                deleted_by = ?,
                last_reviewed_at = ?
            WHERE id = ? AND moderation_status = ?
            "#,
        )
        .bind(new_state.status.as_str())
        .bind(&new_state.reason)
        .bind(&new_state.notes)
        .bind(new_state.hidden_at)
        .bind(&new_state.deleted_by)
        .bind(new_state.last_reviewed_at)
        .bind(comment_id)
        .bind(expected_status)
        .execute(&mut *tx)
        .await?;

        let taken = result.rows_affected() == 1;
        if taken {
            audit::append_tx(&mut tx, audit_entry).await?;
            tx.commit().await?;
        } else {
            tx.rollback().await?;
        }
        Ok(taken)
    }

    // 管理员硬删除：评论与其全部举报一并清除
    pub async fn hard_delete_comment(
        &self,
        comment_id: &str,
        audit_entry: &AuditLogEntry,
    ) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM comment_reports WHERE comment_id = ?")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;
        audit::append_tx(&mut tx, audit_entry).await?;
        tx.commit().await?;
        Ok(())
    }
}

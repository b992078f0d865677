use crate::{models::SqlAuditLog, Db};
use domain::AuditLogEntry;
use sqlx::{Sqlite, Transaction};

// 事务内追加审计行；所有需要审计的复合写都复用这个入口
pub(crate) async fn append_tx(
    tx: &mut Transaction<'_, Sqlite>,
    entry: &AuditLogEntry,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (actor_id, action, target_type, target_id, metadata, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&entry.actor_id)
    .bind(&entry.action)
    .bind(&entry.target_type)
    .bind(&entry.target_id)
    .bind(serde_json::to_string(&entry.metadata)?)
    .bind(entry.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

impl Db {
    pub async fn append_audit(&self, entry: &AuditLogEntry) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        append_tx(&mut tx, entry).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn list_audit_for_target(
        &self,
        target_type: &str,
        target_id: &str,
    ) -> anyhow::Result<Vec<AuditLogEntry>> {
        let rows = sqlx::query_as::<_, SqlAuditLog>(
            r#"
            SELECT actor_id, action, target_type, target_id, metadata, created_at
            FROM audit_logs
            WHERE target_type = ? AND target_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(target_type)
        .bind(target_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

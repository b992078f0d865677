use crate::{models::SqlAccount, Db};
use chrono::NaiveDateTime;
use domain::Account;

impl Db {
    pub async fn get_account(&self, id: &str) -> anyhow::Result<Option<Account>> {
        let row = sqlx::query_as::<_, SqlAccount>(
            "SELECT id, role, created_at, deactivated_at FROM accounts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    // 启动引导与测试夹具用
    pub async fn upsert_account(
        &self,
        id: &str,
        role: &str,
        created_at: NaiveDateTime,
        deactivated_at: Option<NaiveDateTime>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, role, created_at, deactivated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                role = excluded.role,
                deactivated_at = excluded.deactivated_at
            "#,
        )
        .bind(id)
        .bind(role)
        .bind(created_at)
        .bind(deactivated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

use crate::{models::SqlSkill, Db};
use chrono::NaiveDateTime;
use domain::{Skill, SkillVersion};
use sqlx::FromRow;

// 近期活动条目：slug + 最新版本的时间与文档引用
#[derive(Debug, Clone, FromRow)]
pub struct ActivityItem {
    pub slug: String,
    pub created_at: NaiveDateTime,
    pub document_ref: String,
}

impl Db {
    pub async fn get_skill_by_slug(&self, slug: &str) -> anyhow::Result<Option<Skill>> {
        let row = sqlx::query_as::<_, SqlSkill>(
            "SELECT id, slug, owner_id, created_at FROM skills WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    pub async fn get_skill_by_id(&self, id: &str) -> anyhow::Result<Option<Skill>> {
        let row = sqlx::query_as::<_, SqlSkill>(
            "SELECT id, slug, owner_id, created_at FROM skills WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    pub async fn count_skills_by_owner(&self, owner_id: &str) -> anyhow::Result<u32> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM skills WHERE owner_id = ?")
                .bind(owner_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count as u32)
    }

    // 新技能 + 首个版本一并落库；质检结论只在这条路径上写入
    pub async fn create_skill_with_version(
        &self,
        skill: &Skill,
        version: &SkillVersion,
    ) -> anyhow::Result<()> {
        let assessment_json = version
            .assessment
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO skills (id, slug, owner_id, created_at) VALUES (?, ?, ?, ?)")
            .bind(&skill.id)
            .bind(skill.slug.as_str())
            .bind(&skill.owner_id)
            .bind(skill.created_at)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO skill_versions
                (id, skill_id, version, document_ref, fingerprint, assessment_json, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&version.id)
        .bind(&version.skill_id)
        .bind(version.version)
        .bind(&version.document_ref)
        .bind(&version.fingerprint)
        .bind(assessment_json)
        .bind(version.created_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    // 既有技能的版本更新：绕过质检（既定策略）
    pub async fn add_skill_version(&self, version: &SkillVersion) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO skill_versions
                (id, skill_id, version, document_ref, fingerprint, assessment_json, created_at)
            VALUES (?, ?, ?, ?, ?, NULL, ?)
            "#,
        )
        .bind(&version.id)
        .bind(&version.skill_id)
        .bind(version.version)
        .bind(&version.document_ref)
        .bind(&version.fingerprint)
        .bind(version.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn next_version_number(&self, skill_id: &str) -> anyhow::Result<i64> {
        let max: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(version) FROM skill_versions WHERE skill_id = ?",
        )
        .bind(skill_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(max.unwrap_or(0) + 1)
    }

    // 按版本创建时间倒序取最新版本条目，用于重复窗口扫描
    pub async fn list_recent_versions_by_owner(
        &self,
        owner_id: &str,
        limit: i64,
    ) -> anyhow::Result<Vec<ActivityItem>> {
        let rows = sqlx::query_as::<_, ActivityItem>(
            r#"
            SELECT s.slug, v.created_at, v.document_ref
            FROM skills s
            JOIN skill_versions v ON v.skill_id = s.id
            WHERE s.owner_id = ?
              AND v.version = (SELECT MAX(version) FROM skill_versions WHERE skill_id = s.id)
            ORDER BY v.created_at DESC
            LIMIT ?
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

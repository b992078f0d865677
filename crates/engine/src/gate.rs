use std::sync::Arc;

use chrono::{Duration, NaiveDateTime, Utc};
use domain::{
    quality, signals, trust, Actor, CoreError, QualityAssessment, QualityDecision, Skill,
    SkillSlug, SkillVersion,
};
use storage::Db;
use tracing::{debug, info};

use crate::new_id;
use crate::traits::{AccountDirectory, ActivityFeed, DocumentStore};

// 重复窗口扫描的上限：窗口与条数双重封顶，O(窗口) 可接受
const ACTIVITY_SCAN_LIMIT: i64 = 25;
const DUPLICATE_WINDOW_HOURS: i64 = 24;

pub struct PublishGate {
    docs: Arc<dyn DocumentStore>,
    accounts: Arc<dyn AccountDirectory>,
    activity: Arc<dyn ActivityFeed>,
}

impl PublishGate {
    pub fn new(
        docs: Arc<dyn DocumentStore>,
        accounts: Arc<dyn AccountDirectory>,
        activity: Arc<dyn ActivityFeed>,
    ) -> Self {
        Self {
            docs,
            accounts,
            activity,
        }
    }

    pub async fn evaluate(
        &self,
        owner_id: &str,
        document: &str,
        now: NaiveDateTime,
    ) -> Result<QualityAssessment, CoreError> {
        let account = self
            .accounts
            .get_account(owner_id)
            .await?
            .ok_or_else(|| CoreError::permission(format!("unknown account: {}", owner_id)))?;
        if account.is_deactivated() {
            return Err(CoreError::permission("account is deactivated"));
        }

        let age = now - account.created_at;
        let prior = self.activity.owned_skill_count(owner_id).await?;
        let tier = trust::classify(age, prior);

        let sig = signals::extract(document);
        let similar = self
            .count_recent_duplicates(owner_id, &sig.fingerprint, now)
            .await?;

        Ok(quality::assess(sig, tier, similar))
    }

    async fn count_recent_duplicates(
        &self,
        owner_id: &str,
        fingerprint: &str,
        now: NaiveDateTime,
    ) -> Result<u32, CoreError> {
        let window = Duration::hours(DUPLICATE_WINDOW_HOURS);
        let items = self
            .activity
            .list_recent(owner_id, ACTIVITY_SCAN_LIMIT)
            .await?;

        let mut matches = 0u32;
        for item in items {
            if now - item.created_at > window {
                continue;
            }
            // 文档取不到时宽松跳过：既不算命中也不报错
            let text = match self.docs.fetch_text(&item.document_ref).await {
                Ok(t) => t,
                Err(e) => {
                    debug!("Skipping unreadable document for {}: {}", item.slug, e);
                    continue;
                }
            };
            if domain::fingerprint::fingerprint(&text) == fingerprint {
                matches += 1;
            }
        }
        Ok(matches)
    }
}

pub struct PublishOutcome {
    pub skill: Skill,
    pub version: SkillVersion,
    pub assessment: Option<QualityAssessment>,
}

pub struct PublishService {
    db: Db,
    docs: Arc<dyn DocumentStore>,
    gate: PublishGate,
}

impl PublishService {
    pub fn new(db: Db, docs: Arc<dyn DocumentStore>, gate: PublishGate) -> Self {
        Self { db, docs, gate }
    }

    pub async fn publish(
        &self,
        actor: &Actor,
        slug: &SkillSlug,
        document_ref: &str,
    ) -> Result<PublishOutcome, CoreError> {
        let document = self
            .docs
            .fetch_text(document_ref)
            .await
            .map_err(|e| CoreError::not_found(format!("document: {}", e)))?;
        if document.trim().is_empty() {
            return Err(CoreError::validation("document is empty"));
        }
        let now = Utc::now().naive_utc();

        match self.db.get_skill_by_slug(slug.as_str()).await? {
            // 全新 slug 才过质检门
            None => {
                let assessment = self.gate.evaluate(&actor.id, &document, now).await?;
                if assessment.decision == QualityDecision::Reject {
                    let reason = assessment
                        .reason
                        .clone()
                        .unwrap_or_else(|| "rejected".into());
                    info!("Publish rejected for {} ({}): {}", slug, actor.id, reason);
                    return Err(CoreError::QualityReject(reason));
                }
                if assessment.decision == QualityDecision::Quarantine {
                    // 隔离不阻断发布，结论随版本落库待人工复核
                    info!("Publish quarantined for {} (score {})", slug, assessment.score);
                }

                let skill = Skill {
                    id: new_id(),
                    slug: slug.clone(),
                    owner_id: actor.id.clone(),
                    created_at: now,
                };
                let version = SkillVersion {
                    id: new_id(),
                    skill_id: skill.id.clone(),
                    version: 1,
                    document_ref: document_ref.to_string(),
                    fingerprint: assessment.signals.fingerprint.clone(),
                    assessment: Some(assessment.clone()),
                    created_at: now,
                };
                self.db.create_skill_with_version(&skill, &version).await?;
                Ok(PublishOutcome {
                    skill,
                    version,
                    assessment: Some(assessment),
                })
            }
            // 既有技能的更新：跳过质检（既定策略，非疏漏）
            Some(skill) => {
                if skill.owner_id != actor.id {
                    return Err(CoreError::permission(format!(
                        "skill {} is owned by another account",
                        slug
                    )));
                }
                let version = SkillVersion {
                    id: new_id(),
                    skill_id: skill.id.clone(),
                    version: self.db.next_version_number(&skill.id).await?,
                    document_ref: document_ref.to_string(),
                    fingerprint: domain::fingerprint::fingerprint(&document),
                    assessment: None,
                    created_at: now,
                };
                self.db.add_skill_version(&version).await?;
                Ok(PublishOutcome {
                    skill,
                    version,
                    assessment: None,
                })
            }
        }
    }
}

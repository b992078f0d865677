use anyhow::Result;
use async_trait::async_trait;
use domain::{Account, StatEvent};
use storage::ActivityItem;

// 外部协作方的窄接口：核心只通过这些 seam 访问外界

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 按存储引用取回文档正文，不存在即失败。
    async fn fetch_text(&self, storage_ref: &str) -> Result<String>;
}

#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn get_account(&self, id: &str) -> Result<Option<Account>>;
}

#[async_trait]
pub trait ActivityFeed: Send + Sync {
    /// 该作者最近的技能活动（最新版本），由 limit 封顶。
    async fn list_recent(&self, owner_id: &str, limit: i64) -> Result<Vec<ActivityItem>>;

    /// 历史发布量，供信任分档使用。
    async fn owned_skill_count(&self, owner_id: &str) -> Result<u32>;
}

#[async_trait]
pub trait StatSink: Send + Sync {
    /// 可见性增减信号，fire-and-forget：失败只记日志，核心不依赖返回值。
    async fn emit(&self, event: StatEvent);
}

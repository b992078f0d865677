use crate::traits::{AccountDirectory, ActivityFeed};
use anyhow::Result;
use async_trait::async_trait;
use domain::Account;
use storage::{ActivityItem, Db};

// 注册表自带的协作方实现：账号与活动都存在本地库里。
// 接口保持窄口径，换成远端目录/活动服务时核心不用动。

pub struct DbAccountDirectory {
    db: Db,
}

impl DbAccountDirectory {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountDirectory for DbAccountDirectory {
    async fn get_account(&self, id: &str) -> Result<Option<Account>> {
        self.db.get_account(id).await
    }
}

pub struct DbActivityFeed {
    db: Db,
}

impl DbActivityFeed {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ActivityFeed for DbActivityFeed {
    async fn list_recent(&self, owner_id: &str, limit: i64) -> Result<Vec<ActivityItem>> {
        self.db.list_recent_versions_by_owner(owner_id, limit).await
    }

    async fn owned_skill_count(&self, owner_id: &str) -> Result<u32> {
        self.db.count_skills_by_owner(owner_id).await
    }
}

use thiserror::Error;

// 错误分类：服务层按变体映射 HTTP 状态码。
// 注意两个非错误路径：重复举报的竞态失败方走"已举报"成功分支；
// quarantine 不是错误，发布照常落库。
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    Permission(String),

    #[error("rate limited: {0}")]
    RateLimit(String),

    #[error("publish rejected: {0}")]
    QualityReject(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        CoreError::NotFound(msg.into())
    }

    pub fn permission(msg: impl Into<String>) -> Self {
        CoreError::Permission(msg.into())
    }
}

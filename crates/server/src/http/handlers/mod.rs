pub mod comments;
pub mod moderation;
pub mod publish;
pub mod sse;

use axum::http::StatusCode;
use domain::CoreError;

// 错误分类 → HTTP 状态码的唯一映射点
pub fn map_core_error(err: CoreError) -> (StatusCode, String) {
    let status = match &err {
        CoreError::Validation(_) => StatusCode::BAD_REQUEST,
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::Permission(_) => StatusCode::FORBIDDEN,
        CoreError::RateLimit(_) => StatusCode::TOO_MANY_REQUESTS,
        CoreError::QualityReject(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("Internal error: {:?}", err);
    }
    (status, err.to_string())
}

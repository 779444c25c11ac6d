//! API错误映射
//!
//! 把核心错误转换为带JSON体的HTTP响应。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use ctflow_core::CtflowError;
use serde_json::json;

/// 处理器统一错误类型
#[derive(Debug)]
pub struct ApiError(pub CtflowError);

/// 处理器统一结果类型
pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<CtflowError> for ApiError {
    fn from(err: CtflowError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self.0 {
            CtflowError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            CtflowError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CtflowError::AlreadyExists(msg) => (StatusCode::CONFLICT, msg.clone()),
            CtflowError::InvalidStateTransition { .. } => {
                (StatusCode::CONFLICT, self.0.to_string())
            }
            CtflowError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()),
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", message);
        }

        let body = Json(json!({
            "error": true,
            "message": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: CtflowError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_of(CtflowError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(CtflowError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(CtflowError::AlreadyExists("x".into())), StatusCode::CONFLICT);
        assert_eq!(
            status_of(CtflowError::InvalidStateTransition {
                from: "Complete".into(),
                event: "SendToNursing".into()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(status_of(CtflowError::Upstream("x".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_of(CtflowError::Database("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

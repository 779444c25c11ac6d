//! 错误定义模块

use thiserror::Error;

/// CTFlow系统统一错误类型
#[derive(Error, Debug)]
pub enum CtflowError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("数据库错误: {0}")]
    Database(String),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("资源已存在: {0}")]
    AlreadyExists(String),

    #[error("上游服务错误: {0}")]
    Upstream(String),

    #[error("网络错误: {0}")]
    Network(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("系统内部错误: {0}")]
    Internal(String),

    #[error("无效状态转换: 从 {from} 到 {event}")]
    InvalidStateTransition { from: String, event: String },
}

/// CTFlow系统统一结果类型
pub type Result<T> = std::result::Result<T, CtflowError>;

use thiserror::Error;
use std::io;

/// 传输任务错误
///
/// 所有变体只携带 `String`，保证错误可以 `Clone` 并穿过 actor 邮箱。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("网络错误: {0}")]
    Network(String),

    #[error("登录已过期: {0}")]
    AuthExpired(String),

    #[error("空间不足: {0}")]
    QuotaExceeded(String),

    #[error("任务已取消")]
    Cancelled,

    #[error("IO错误: {0}")]
    Io(String),

    #[error("状态持久化失败: {0}")]
    Persist(String),

    #[error("配置无效: {0}")]
    InvalidConfig(String),

    #[error("不支持的操作: {0}")]
    Unsupported(String),

    #[error("未知错误: {0}")]
    Unknown(String),
}

impl TransferError {
    /// 只有网络错误允许自动重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransferError::Network(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransferError::Cancelled)
    }

    /// 需要上报给应用层处理的错误（例如提示重新登录）
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, TransferError::AuthExpired(_))
    }

    /// 写入完成列表、展示给用户的错误信息
    pub fn user_message(&self) -> String {
        match self {
            TransferError::AuthExpired(_) => "登录已过期，请重新登录".to_string(),
            TransferError::QuotaExceeded(msg) => format!("网盘空间不足: {}", msg),
            other => other.to_string(),
        }
    }

    pub fn network(msg: impl Into<String>) -> Self {
        TransferError::Network(msg.into())
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        TransferError::Unknown(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        TransferError::InvalidConfig(msg.into())
    }
}

impl From<io::Error> for TransferError {
    fn from(error: io::Error) -> Self {
        TransferError::Io(error.to_string())
    }
}

impl From<serde_json::Error> for TransferError {
    fn from(error: serde_json::Error) -> Self {
        TransferError::Persist(error.to_string())
    }
}

impl From<actix::MailboxError> for TransferError {
    fn from(error: actix::MailboxError) -> Self {
        TransferError::Unknown(format!("队列不可用: {}", error))
    }
}

impl From<String> for TransferError {
    fn from(error: String) -> Self {
        TransferError::Unknown(error)
    }
}

impl From<&str> for TransferError {
    fn from(error: &str) -> Self {
        TransferError::Unknown(error.to_string())
    }
}

pub type TransferResult<T> = Result<T, TransferError>;

// ==========================================
// 厨房成本控制系统 - 后端服务错误类型
// ==========================================
// 职责: 远端服务调用失败的结构化错误
// 说明: kind 为 Unclassified 时，由 ErrorClassifier 按消息文本兜底分类
// ==========================================

use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 后端错误类别（服务端能明确给出时使用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendErrorKind {
    ServiceUnavailable,
    Network,
    Auth,
    Validation,
    Unclassified,
}

/// 后端服务错误
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::ServiceUnavailable, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Network, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Auth, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Validation, message)
    }

    /// 仅有原始文本的错误（如传输层透传的 reject 消息）
    pub fn unclassified(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Unclassified, message)
    }
}

impl From<RepositoryError> for BackendError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, .. } => {
                BackendError::validation(format!("{} not found", entity))
            }
            RepositoryError::UniqueConstraintViolation(_) => {
                BackendError::validation("Item already exists")
            }
            RepositoryError::FieldValueError { field, message } => {
                BackendError::validation(format!("Invalid {}: {}", field, message))
            }
            other => BackendError::unclassified(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_只输出消息() {
        let err = BackendError::service_unavailable("IC0508: Canister is stopped");
        assert_eq!(err.to_string(), "IC0508: Canister is stopped");
        assert_eq!(err.kind, BackendErrorKind::ServiceUnavailable);
    }

    #[test]
    fn test_from_repository_error() {
        let err: BackendError = RepositoryError::NotFound {
            entity: "Recipe".to_string(),
            id: "Dosa".to_string(),
        }
        .into();
        assert_eq!(err.kind, BackendErrorKind::Validation);
        assert_eq!(err.message, "Recipe not found");

        let err: BackendError = RepositoryError::LockError("poisoned".to_string()).into();
        assert_eq!(err.kind, BackendErrorKind::Unclassified);
    }
}

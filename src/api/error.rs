// ==========================================
// 厨房成本控制系统 - API层错误类型
// ==========================================
// 职责: 汇总后端/重试/引擎/仓储错误，保留分类与可重试信息
// 说明: Validation/Auth 立即上报；ServiceUnavailable/Network 仅在重试耗尽后上报
// ==========================================

use crate::backend::error::BackendError;
use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use crate::supervisor::error_classifier::{classify, ErrorKind};
use crate::supervisor::retry::RetryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 后端可用性错误（可重试）
    // ==========================================
    #[error("服务暂时不可用（已尝试{attempts}次）: {message}")]
    ServiceUnavailable { message: String, attempts: u32 },

    #[error("网络错误（已尝试{attempts}次）: {message}")]
    Network { message: String, attempts: u32 },

    // ==========================================
    // 业务错误（不重试）
    // ==========================================
    #[error("{0}")]
    Auth(String),

    /// 后端或表单校验失败，文本可直接展示
    #[error("{0}")]
    Validation(String),

    #[error("Missing costs for: {}", .names.join(", "))]
    MissingCosts { names: Vec<String> },

    #[error("No cost data available")]
    NoCostData,

    #[error("计算错误: {0}")]
    Calculation(#[from] EngineError),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("操作已取消: {0}")]
    Cancelled(String),

    /// 未分类的后端错误（保留原始消息，展示前需过滤）
    #[error("{0}")]
    Unknown(String),

    // ==========================================
    // 本地存储错误
    // ==========================================
    #[error("数据库错误: {0}")]
    Storage(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 由已分类的后端错误构造
    pub fn from_backend(err: BackendError, kind: ErrorKind, attempts: u32) -> Self {
        let message = err.message;
        match kind {
            ErrorKind::ServiceUnavailable => ApiError::ServiceUnavailable { message, attempts },
            ErrorKind::Network => ApiError::Network { message, attempts },
            ErrorKind::Auth => ApiError::Auth(message),
            ErrorKind::Validation => ApiError::Validation(message),
            ErrorKind::Unknown => ApiError::Unknown(message),
        }
    }

    /// 是否提供“立即重试”入口
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::ServiceUnavailable { .. } | ApiError::Network { .. }
        )
    }

    /// 错误类别（用于文案与恢复建议）
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::ServiceUnavailable { .. } => ErrorKind::ServiceUnavailable,
            ApiError::Network { .. } => ErrorKind::Network,
            ApiError::Auth(_) => ErrorKind::Auth,
            ApiError::Validation(_)
            | ApiError::MissingCosts { .. }
            | ApiError::NoCostData
            | ApiError::Calculation(_)
            | ApiError::InvalidInput(_)
            | ApiError::NotFound(_) => ErrorKind::Validation,
            ApiError::Cancelled(_)
            | ApiError::Unknown(_)
            | ApiError::Storage(_)
            | ApiError::InternalError(_)
            | ApiError::Other(_) => ErrorKind::Unknown,
        }
    }

    /// 错误码
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
            ApiError::Network { .. } => "NETWORK_ERROR",
            ApiError::Auth(_) => "AUTH_ERROR",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::MissingCosts { .. } => "MISSING_COSTS",
            ApiError::NoCostData => "NO_COST_DATA",
            ApiError::Calculation(_) => "CALCULATION_ERROR",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Cancelled(_) => "CANCELLED",
            ApiError::Unknown(_) => "UNKNOWN_ERROR",
            ApiError::Storage(_) => "STORAGE_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::Other(_) => "UNKNOWN_ERROR",
        }
    }
}

// ==========================================
// 从 BackendError 转换（未经重试的单次调用）
// ==========================================
impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        let kind = classify(&err);
        ApiError::from_backend(err, kind, 1)
    }
}

impl From<RetryError> for ApiError {
    fn from(err: RetryError) -> Self {
        match err {
            RetryError::Cancelled { operation } => ApiError::Cancelled(operation),
            RetryError::Failed {
                source,
                attempts,
                kind,
            } => ApiError::from_backend(source, kind, attempts),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换（本地生产历史）
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::Storage(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg)
            | RepositoryError::UniqueConstraintViolation(msg)
            | RepositoryError::ForeignKeyViolation(msg) => ApiError::Storage(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// 厨房成本控制系统 - 错误响应映射
// ==========================================
// 职责: ApiError → 前端 JSON 错误响应（文案、恢复建议、可重试标记）
// ==========================================

use crate::api::error::ApiError;
use crate::i18n;
use crate::supervisor::error_classifier::{message_for, recovery_instructions_in};
use serde::{Deserialize, Serialize};

/// 错误响应（返回给前端）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// 面向用户的错误消息
    pub message: String,

    /// 恢复建议
    pub recovery: String,

    /// 是否展示"立即重试"
    pub retryable: bool,

    /// 详细信息（可选）
    pub details: Option<serde_json::Value>,
}

/// 映射为错误响应（当前语言）
pub fn map_api_error(err: &ApiError) -> ErrorResponse {
    map_api_error_in(&i18n::current_locale(), err)
}

/// 映射为错误响应（指定语言）
pub fn map_api_error_in(locale: &str, err: &ApiError) -> ErrorResponse {
    let kind = err.kind();

    let message = match err {
        ApiError::ServiceUnavailable { message, .. }
        | ApiError::Network { message, .. }
        | ApiError::Auth(message)
        | ApiError::Validation(message)
        | ApiError::Unknown(message) => message_for(locale, kind, message),
        ApiError::MissingCosts { names } => i18n::t_with_args_in(
            locale,
            "errors.missing_costs",
            &[("names", &names.join(", "))],
        ),
        ApiError::NoCostData => i18n::t_in(locale, "errors.no_cost_data"),
        ApiError::Cancelled(_) => i18n::t_in(locale, "errors.cancelled"),
        other => other.to_string(),
    };

    let details = match err {
        ApiError::ServiceUnavailable { attempts, .. } | ApiError::Network { attempts, .. } => {
            Some(serde_json::json!({ "attempts": attempts }))
        }
        ApiError::MissingCosts { names } => Some(serde_json::json!({ "missing": names })),
        _ => None,
    };

    ErrorResponse {
        code: err.code().to_string(),
        message,
        recovery: recovery_instructions_in(locale, kind),
        retryable: err.is_retryable(),
        details,
    }
}

/// 映射为 JSON 字符串
pub fn map_api_error_json(err: &ApiError) -> String {
    serde_json::to_string(&map_api_error(err)).unwrap_or_else(|_| err.to_string())
}

// ==========================================
// 厨房成本控制系统 - 错误分类器
// ==========================================
// 职责: 将后端错误归入 ServiceUnavailable / Network / Auth / Validation / Unknown
// 规则:
// - BackendError 带明确 kind 时直接采用
// - kind 为 Unclassified 时按消息文本（忽略大小写）匹配，顺序固定
// - 面向用户的文案经 i18n 输出
// ==========================================

use crate::backend::error::{BackendError, BackendErrorKind};
use crate::i18n;
use serde::{Deserialize, Serialize};

// 匹配关键字（小写）
const SERVICE_UNAVAILABLE_TOKENS: &[&str] = &[
    "ic0508",
    "ic0503",
    "service temporarily unavailable",
    "not running",
];
const NETWORK_TOKENS: &[&str] = &[
    "network",
    "timeout",
    "fetch",
    "connection",
    "econnrefused",
    "failed to fetch",
];
const AUTH_TOKENS: &[&str] = &[
    "admin not set up",
    "only the admin",
    "authentication",
    "unauthorized",
];
const VALIDATION_TOKENS: &[&str] = &[
    "already exists",
    "not found",
    "cannot be negative",
    "cannot be empty",
    "invalid",
];
// 含这些词的原始消息不直接展示给用户
const TECHNICAL_TOKENS: &[&str] = &["actor", "undefined", "null"];

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ServiceUnavailable,
    Network,
    Auth,
    Validation,
    Unknown,
}

impl ErrorKind {
    /// 是否属于可重试的瞬时故障
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorKind::ServiceUnavailable | ErrorKind::Network)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorKind::Network => "NETWORK",
            ErrorKind::Auth => "AUTH",
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Unknown => "UNKNOWN",
        }
    }
}

fn contains_any(haystack: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|t| haystack.contains(t))
}

/// 按消息文本分类
pub fn classify_message(message: &str) -> ErrorKind {
    let msg = message.to_lowercase();

    if contains_any(&msg, SERVICE_UNAVAILABLE_TOKENS)
        || (msg.contains("canister") && msg.contains("stopped"))
    {
        ErrorKind::ServiceUnavailable
    } else if contains_any(&msg, NETWORK_TOKENS) {
        ErrorKind::Network
    } else if contains_any(&msg, AUTH_TOKENS) {
        ErrorKind::Auth
    } else if contains_any(&msg, VALIDATION_TOKENS) {
        ErrorKind::Validation
    } else {
        ErrorKind::Unknown
    }
}

/// 分类后端错误（结构化 kind 优先）
pub fn classify(err: &BackendError) -> ErrorKind {
    match err.kind {
        BackendErrorKind::ServiceUnavailable => ErrorKind::ServiceUnavailable,
        BackendErrorKind::Network => ErrorKind::Network,
        BackendErrorKind::Auth => ErrorKind::Auth,
        BackendErrorKind::Validation => ErrorKind::Validation,
        BackendErrorKind::Unclassified => classify_message(&err.message),
    }
}

/// 原始消息是否可直接展示
pub fn is_user_safe(message: &str) -> bool {
    let msg = message.to_lowercase();
    !contains_any(&msg, TECHNICAL_TOKENS)
}

/// 面向用户的错误文案（当前语言）
pub fn user_message(err: &BackendError) -> String {
    user_message_in(&i18n::current_locale(), err)
}

/// 面向用户的错误文案（指定语言）
pub fn user_message_in(locale: &str, err: &BackendError) -> String {
    message_for(locale, classify(err), &err.message)
}

/// 按类别与原始消息生成文案
pub fn message_for(locale: &str, kind: ErrorKind, raw_message: &str) -> String {
    if raw_message.trim().is_empty() && kind == ErrorKind::Unknown {
        return i18n::t_in(locale, "errors.unexpected_short");
    }

    match kind {
        ErrorKind::ServiceUnavailable => return i18n::t_in(locale, "errors.service_unavailable"),
        ErrorKind::Network => return i18n::t_in(locale, "errors.network"),
        ErrorKind::Auth => return i18n::t_in(locale, "errors.auth"),
        ErrorKind::Validation | ErrorKind::Unknown => {}
    }

    let msg = raw_message.to_lowercase();
    let key = if msg.contains("already exists") {
        Some("errors.already_exists")
    } else if msg.contains("not found") {
        Some("errors.not_found")
    } else if msg.contains("cannot be negative") {
        Some("errors.negative")
    } else if msg.contains("cannot be empty") {
        Some("errors.empty")
    } else if msg.contains("reject") {
        Some("errors.rejected")
    } else {
        None
    };

    match key {
        Some(key) => i18n::t_in(locale, key),
        None if is_user_safe(raw_message) && !raw_message.trim().is_empty() => raw_message.to_string(),
        None => i18n::t_in(locale, "errors.unexpected"),
    }
}

/// 恢复建议（当前语言）
pub fn recovery_instructions(kind: ErrorKind) -> String {
    recovery_instructions_in(&i18n::current_locale(), kind)
}

/// 恢复建议（指定语言）
pub fn recovery_instructions_in(locale: &str, kind: ErrorKind) -> String {
    let key = match kind {
        ErrorKind::ServiceUnavailable => "recovery.service_unavailable",
        ErrorKind::Network => "recovery.network",
        ErrorKind::Auth => "recovery.auth",
        ErrorKind::Validation | ErrorKind::Unknown => "recovery.default",
    };
    i18n::t_in(locale, key)
}

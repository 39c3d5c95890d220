// ==========================================
// 厨房成本控制系统 - 重试监督器
// ==========================================
// 职责: 对每次后端调用统一施加有界指数退避重试
// 规则:
// - Validation / Auth 从不重试
// - ServiceUnavailable / Network 在 attempt_count < max_retries 时重试
// - 其他含 "reject" 的错误仅首次失败后重试一次
// - delay(i) = min(base * 2^i, cap)，无抖动
// 取消: 每次尝试前及等待期间检查 CancellationToken
// ==========================================

use crate::backend::error::{BackendError, BackendResult};
use crate::config::supervisor_config::RetryConfig;
use crate::supervisor::error_classifier::{classify, ErrorKind};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 是否应重试
///
/// # 参数
/// - attempt_count: 已失败次数（首次失败为 0）
/// - max_retries: 可重试类错误的最大重试次数
pub fn should_retry(err: &BackendError, attempt_count: u32, max_retries: u32) -> bool {
    match classify(err) {
        ErrorKind::Validation | ErrorKind::Auth => false,
        ErrorKind::ServiceUnavailable | ErrorKind::Network => attempt_count < max_retries,
        ErrorKind::Unknown => err.message.to_lowercase().contains("reject") && attempt_count < 1,
    }
}

/// 第 attempt_index 次重试前的等待时长（饱和计算）
pub fn delay_for_attempt(attempt_index: u32, base: Duration, cap: Duration) -> Duration {
    let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
    let cap_ms = u64::try_from(cap.as_millis()).unwrap_or(u64::MAX);
    let factor = 2u64.saturating_pow(attempt_index);
    Duration::from_millis(base_ms.saturating_mul(factor).min(cap_ms))
}

// ==========================================
// RetryPolicy
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(RetryConfig::default())
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(config: RetryConfig) -> Self {
        Self {
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
            max_retries: config.max_retries,
        }
    }
}

impl RetryPolicy {
    pub fn should_retry(&self, err: &BackendError, attempt_count: u32) -> bool {
        should_retry(err, attempt_count, self.max_retries)
    }

    pub fn delay_for_attempt(&self, attempt_index: u32) -> Duration {
        delay_for_attempt(attempt_index, self.base_delay, self.max_delay)
    }
}

// ==========================================
// RetryError
// ==========================================
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetryError {
    #[error("操作已取消: {operation}")]
    Cancelled { operation: String },

    #[error("{source}")]
    Failed {
        #[source]
        source: BackendError,
        attempts: u32, // 实际调用次数
        kind: ErrorKind,
    },
}

// ==========================================
// RetrySupervisor
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct RetrySupervisor {
    policy: RetryPolicy,
}

impl RetrySupervisor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// 带重试执行一次后端操作
    ///
    /// # 参数
    /// - operation: 操作名（仅用于日志）
    /// - cancel: 取消令牌；取消后不再发起新的尝试
    /// - op: 每次调用产生一个新的 future
    ///
    /// # 返回
    /// - Ok(T): 某次尝试成功
    /// - Err(Cancelled): 尝试前或等待期间被取消
    /// - Err(Failed): 不可重试或重试耗尽，携带最后一次错误
    pub async fn run<T, F, Fut>(
        &self,
        operation: &str,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = BackendResult<T>>,
    {
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                debug!(operation, attempt, "取消令牌已触发，停止重试");
                return Err(RetryError::Cancelled {
                    operation: operation.to_string(),
                });
            }

            match op().await {
                Ok(value) => {
                    if attempt > 0 {
                        info!(operation, attempts = attempt + 1, "重试后调用成功");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    let kind = classify(&err);
                    if !self.policy.should_retry(&err, attempt) {
                        if kind.is_transient() {
                            warn!(operation, attempts = attempt + 1, error = %err, "重试次数耗尽");
                        }
                        return Err(RetryError::Failed {
                            source: err,
                            attempts: attempt + 1,
                            kind,
                        });
                    }

                    let delay = self.policy.delay_for_attempt(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        kind = kind.as_str(),
                        error = %err,
                        "后端调用失败，退避后重试"
                    );

                    tokio::select! {
                        _ = cancel.cancelled() => {
                            debug!(operation, attempt, "退避等待期间被取消");
                            return Err(RetryError::Cancelled {
                                operation: operation.to_string(),
                            });
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
            }
        }
    }
}

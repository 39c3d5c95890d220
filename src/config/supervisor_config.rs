// ==========================================
// 厨房成本控制系统 - 可用性监督配置
// ==========================================
// 职责: 重试退避与健康监测的参数对象
// 来源: ConfigManager::get_retry_config / get_health_monitor_config
// ==========================================

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 2_000;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 16_000;
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 5;

pub const DEFAULT_HEALTH_INTERVAL_HEALTHY_MS: u64 = 10_000;
pub const DEFAULT_HEALTH_INTERVAL_UNHEALTHY_MS: u64 = 3_000;
pub const DEFAULT_HEALTH_MAX_RETRY_COUNT: u32 = 10;
pub const DEFAULT_HEALTH_CHECK_TIMEOUT_MS: u64 = 5_000;

/// 重试退避配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub base_delay_ms: u64, // 第 0 次重试前的等待
    pub max_delay_ms: u64,  // 退避上限
    pub max_retries: u32,   // 可重试类错误的最大重试次数
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
            max_retries: DEFAULT_RETRY_MAX_ATTEMPTS,
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

/// 健康监测配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthMonitorConfig {
    pub healthy_interval_ms: u64,
    pub unhealthy_interval_ms: u64,
    pub max_retry_count: u32,
    pub check_timeout_ms: u64,
}

impl Default for HealthMonitorConfig {
    fn default() -> Self {
        Self {
            healthy_interval_ms: DEFAULT_HEALTH_INTERVAL_HEALTHY_MS,
            unhealthy_interval_ms: DEFAULT_HEALTH_INTERVAL_UNHEALTHY_MS,
            max_retry_count: DEFAULT_HEALTH_MAX_RETRY_COUNT,
            check_timeout_ms: DEFAULT_HEALTH_CHECK_TIMEOUT_MS,
        }
    }
}

impl HealthMonitorConfig {
    pub fn healthy_interval(&self) -> Duration {
        Duration::from_millis(self.healthy_interval_ms)
    }

    pub fn unhealthy_interval(&self) -> Duration {
        Duration::from_millis(self.unhealthy_interval_ms)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }
}

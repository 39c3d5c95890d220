// ==========================================
// 厨房成本控制系统 - 配置层
// ==========================================
// 职责: 系统配置管理（重试退避、健康监测）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod supervisor_config;

pub use config_manager::{config_keys, ConfigManager};
pub use supervisor_config::{HealthMonitorConfig, RetryConfig};

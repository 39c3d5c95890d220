// ==========================================
// 厨房成本控制系统 - 可用性监督层
// ==========================================
// 职责: 错误分类、重试退避、健康监测
// ==========================================

pub mod error_classifier;
pub mod health;
pub mod retry;

pub use error_classifier::{classify, classify_message, ErrorKind};
pub use health::{CacheInvalidator, HealthMonitor, HealthState};
pub use retry::{RetryError, RetryPolicy, RetrySupervisor};

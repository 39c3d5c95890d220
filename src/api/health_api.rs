// ==========================================
// 厨房成本控制系统 - 连接状态 API
// ==========================================
// 职责: 为连接状态横幅提供视图（检查中 / 错误 / 重试次数 / 恢复提示）
// ==========================================

use crate::domain::types::HealthStatus;
use crate::i18n::t;
use crate::supervisor::error_classifier::{recovery_instructions, ErrorKind};
use crate::supervisor::health::{HealthMonitor, HealthState};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// "连接已恢复" 提示的展示时长
pub const RESTORED_BANNER_WINDOW: Duration = Duration::from_secs(5);

/// 连接状态横幅视图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub status: HealthStatus,
    pub is_checking: bool,
    pub retry_count: u32,
    pub last_error: Option<String>,
    pub recovery: Option<String>,
    pub restored_message: Option<String>, // 恢复后短时间内展示
}

pub struct HealthApi {
    monitor: Arc<HealthMonitor>,
}

impl HealthApi {
    pub fn new(monitor: Arc<HealthMonitor>) -> Self {
        Self { monitor }
    }

    /// 当前连接状态
    pub fn connection_status(&self) -> ConnectionStatus {
        Self::view(&self.monitor.state())
    }

    /// 立即检查（"立即重试" 按钮）
    pub async fn check_now(&self) -> ConnectionStatus {
        Self::view(&self.monitor.check_now().await)
    }

    fn view(state: &HealthState) -> ConnectionStatus {
        let unhealthy = !state.is_healthy();
        ConnectionStatus {
            status: state.status,
            is_checking: state.is_checking,
            retry_count: state.retry_count,
            last_error: state.last_error.clone(),
            recovery: unhealthy.then(|| {
                recovery_instructions(state.last_error_kind.unwrap_or(ErrorKind::ServiceUnavailable))
            }),
            restored_message: state
                .recently_recovered(Utc::now(), RESTORED_BANNER_WINDOW)
                .then(|| t("health.restored")),
        }
    }
}

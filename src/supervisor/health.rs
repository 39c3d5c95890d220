// ==========================================
// 厨房成本控制系统 - 后端健康监测
// ==========================================
// 状态机: Healthy ⇄ Unhealthy（初始 Healthy）
// - 检查成功: Healthy；若此前 Unhealthy，则全量失效缓存（每次恢复恰好一次）并清零 retry_count
// - ServiceUnavailable / Network 失败: Unhealthy，retry_count +1（封顶）
// - 其他失败: 状态不变
// 节奏: 健康时 10s，不健康时 3s
// 说明: 本模块定义 CacheInvalidator，缓存层实现（依赖倒置）
// ==========================================

use crate::backend::error::BackendError;
use crate::backend::KitchenBackend;
use crate::config::supervisor_config::HealthMonitorConfig;
use crate::domain::types::HealthStatus;
use crate::supervisor::error_classifier::{classify, user_message, ErrorKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 缓存失效接口（服务恢复时调用）
pub trait CacheInvalidator: Send + Sync {
    fn invalidate_all(&self);
}

/// 健康状态快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthState {
    pub status: HealthStatus,
    pub last_error: Option<String>, // 已分类的用户文案
    pub last_error_kind: Option<ErrorKind>,
    pub retry_count: u32,
    pub is_checking: bool,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub recovered_at: Option<DateTime<Utc>>, // 最近一次从 Unhealthy 恢复的时间
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            status: HealthStatus::Healthy,
            last_error: None,
            last_error_kind: None,
            retry_count: 0,
            is_checking: false,
            last_checked_at: None,
            recovered_at: None,
        }
    }
}

impl HealthState {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }

    /// 恢复提示是否仍在展示窗口内
    pub fn recently_recovered(&self, now: DateTime<Utc>, window: Duration) -> bool {
        match (self.recovered_at, chrono::Duration::from_std(window)) {
            (Some(at), Ok(window)) => self.is_healthy() && now - at <= window,
            _ => false,
        }
    }
}

// ==========================================
// HealthMonitor
// ==========================================
pub struct HealthMonitor {
    backend: Arc<dyn KitchenBackend>,
    invalidator: Arc<dyn CacheInvalidator>,
    config: HealthMonitorConfig,
    state: Mutex<HealthState>,
    tx: watch::Sender<HealthState>,
    in_flight: AtomicU32, // 进行中的检查数（手动检查可能与定时检查重叠）
}

// 进行中检查的登记；drop 时注销（含 future 被中途丢弃的情况）
struct InFlightCheck<'a>(&'a HealthMonitor);

impl Drop for InFlightCheck<'_> {
    fn drop(&mut self) {
        let monitor = self.0;
        monitor.update(|s| {
            s.is_checking = monitor.in_flight.fetch_sub(1, Ordering::SeqCst) > 1;
        });
    }
}

impl HealthMonitor {
    pub fn new(
        backend: Arc<dyn KitchenBackend>,
        invalidator: Arc<dyn CacheInvalidator>,
        config: HealthMonitorConfig,
    ) -> Self {
        let (tx, _rx) = watch::channel(HealthState::default());
        Self {
            backend,
            invalidator,
            config,
            state: Mutex::new(HealthState::default()),
            tx,
            in_flight: AtomicU32::new(0),
        }
    }

    pub fn config(&self) -> &HealthMonitorConfig {
        &self.config
    }

    /// 当前状态快照
    pub fn state(&self) -> HealthState {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<HealthState> {
        self.tx.subscribe()
    }

    pub fn is_healthy(&self) -> bool {
        self.state().is_healthy()
    }

    /// 下一次检查前的等待时长
    pub fn current_interval(&self) -> Duration {
        if self.is_healthy() {
            self.config.healthy_interval()
        } else {
            self.config.unhealthy_interval()
        }
    }

    // 修改状态并广播；返回修改后的快照
    fn update<R>(&self, f: impl FnOnce(&mut HealthState) -> R) -> (R, HealthState) {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let r = f(&mut guard);
        let snapshot = guard.clone();
        drop(guard);
        self.tx.send_replace(snapshot.clone());
        (r, snapshot)
    }

    /// 记录一次成功检查
    ///
    /// # 返回
    /// - true: 本次为 Unhealthy → Healthy 的恢复（已触发缓存全量失效）
    pub fn record_success(&self) -> bool {
        let now = Utc::now();
        let (recovered, _) = self.update(|s| {
            let recovered = s.status == HealthStatus::Unhealthy;
            s.status = HealthStatus::Healthy;
            s.retry_count = 0;
            s.last_error = None;
            s.last_error_kind = None;
            s.is_checking = self.checks_in_flight();
            s.last_checked_at = Some(now);
            if recovered {
                s.recovered_at = Some(now);
            }
            recovered
        });

        if recovered {
            info!("后端服务已恢复，失效全部查询缓存");
            self.invalidator.invalidate_all();
        }
        recovered
    }

    /// 记录一次失败检查
    ///
    /// # 返回
    /// - 错误分类结果
    pub fn record_failure(&self, err: &BackendError) -> ErrorKind {
        let kind = classify(err);
        let max_retry_count = self.config.max_retry_count;
        let message = user_message(err);

        let (_, snapshot) = self.update(|s| {
            s.is_checking = self.checks_in_flight();
            s.last_checked_at = Some(Utc::now());
            if kind.is_transient() {
                s.status = HealthStatus::Unhealthy;
                s.retry_count = (s.retry_count + 1).min(max_retry_count);
                s.last_error = Some(message);
                s.last_error_kind = Some(kind);
            }
        });

        if kind.is_transient() {
            warn!(
                kind = kind.as_str(),
                retry_count = snapshot.retry_count,
                error = %err,
                "健康检查失败"
            );
        } else {
            debug!(kind = kind.as_str(), error = %err, "健康检查返回非可用性错误，状态不变");
        }
        kind
    }

    fn checks_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    fn begin_check(&self) -> InFlightCheck<'_> {
        self.update(|s| {
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            s.is_checking = true;
        });
        InFlightCheck(self)
    }

    /// 立即执行一次检查（不影响后台定时节奏）
    ///
    /// 与其他检查重叠时，is_checking 保持到最后一个检查结束
    pub async fn check_now(&self) -> HealthState {
        {
            let _check = self.begin_check();
            let outcome =
                tokio::time::timeout(self.config.check_timeout(), self.backend.check_health())
                    .await;

            match outcome {
                Ok(Ok(true)) => {
                    self.record_success();
                }
                Ok(Ok(false)) => {
                    self.record_failure(&BackendError::service_unavailable(
                        "Service temporarily unavailable",
                    ));
                }
                Ok(Err(err)) => {
                    self.record_failure(&err);
                }
                Err(_) => {
                    self.record_failure(&BackendError::network("Health check timeout"));
                }
            }
        }
        self.state()
    }

    /// 启动后台检查循环（先立即检查一次，取消令牌触发后退出）
    pub fn spawn(self: &Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            info!("健康监测已启动");
            loop {
                if token.is_cancelled() {
                    break;
                }
                monitor.check_now().await;

                let interval = monitor.current_interval();
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            info!("健康监测已停止");
        })
    }
}

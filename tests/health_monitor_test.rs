// ==========================================
// HealthMonitor 集成测试
// ==========================================
// 测试范围:
// 1. 失败 → Unhealthy，重试计数封顶
// 2. 恢复时恰好一次全量缓存失效
// 3. 超时、check_health 返回 false
// 4. 后台循环的自适应间隔与取消
// ==========================================

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use kitchen_cost_control::backend::BackendError;
use kitchen_cost_control::cache::{QueryCache, QueryKey};
use kitchen_cost_control::config::HealthMonitorConfig;
use kitchen_cost_control::domain::HealthStatus;
use kitchen_cost_control::supervisor::HealthMonitor;
use tokio_util::sync::CancellationToken;

use helpers::flaky_backend::FlakyBackend;

fn setup(config: HealthMonitorConfig) -> (Arc<HealthMonitor>, Arc<FlakyBackend>, Arc<QueryCache>) {
    let backend = Arc::new(FlakyBackend::in_memory());
    let cache = Arc::new(QueryCache::new());
    let monitor = Arc::new(HealthMonitor::new(backend.clone(), cache.clone(), config));
    (monitor, backend, cache)
}

fn unavailable() -> BackendError {
    BackendError::unclassified("IC0508: Canister is stopped")
}

#[tokio::test]
async fn test_初始状态_乐观健康() {
    let (monitor, backend, _cache) = setup(HealthMonitorConfig::default());
    let state = monitor.state();
    assert_eq!(state.status, HealthStatus::Healthy);
    assert_eq!(state.retry_count, 0);
    assert!(state.last_error.is_none());
    assert_eq!(backend.calls("check_health"), 0);
}

#[tokio::test]
async fn test_两次失败后恢复_仅一次缓存失效() {
    let (monitor, backend, cache) = setup(HealthMonitorConfig::default());
    backend.script_health(vec![Err(unavailable()), Err(unavailable()), Ok(true)]);

    cache.put(QueryKey::RawMaterials, &vec!["cached".to_string()]);
    let generation = cache.generation();

    let first = monitor.check_now().await;
    assert_eq!(first.status, HealthStatus::Unhealthy);
    assert_eq!(first.retry_count, 1);
    assert!(first.last_error.is_some());
    assert!(!first.is_checking);

    let second = monitor.check_now().await;
    assert_eq!(second.retry_count, 2);
    assert!(cache.contains(&QueryKey::RawMaterials));

    let third = monitor.check_now().await;
    assert_eq!(third.status, HealthStatus::Healthy);
    assert_eq!(third.retry_count, 0);
    assert!(third.last_error.is_none());
    assert!(third.recovered_at.is_some());
    assert!(!cache.contains(&QueryKey::RawMaterials));
    assert_eq!(cache.generation(), generation + 1);

    // 已健康时再次成功不触发失效
    monitor.check_now().await;
    assert_eq!(cache.generation(), generation + 1);
}

#[tokio::test]
async fn test_重试计数封顶() {
    let (monitor, backend, _cache) = setup(HealthMonitorConfig {
        max_retry_count: 3,
        ..HealthMonitorConfig::default()
    });
    backend.fail_next("check_health", BackendError::network("Failed to fetch"), 5);

    for _ in 0..5 {
        monitor.check_now().await;
    }
    assert_eq!(monitor.state().retry_count, 3);
}

#[tokio::test]
async fn test_返回false_视为服务不可用() {
    let (monitor, backend, _cache) = setup(HealthMonitorConfig::default());
    backend.script_health(vec![Ok(false)]);

    let state = monitor.check_now().await;
    assert_eq!(state.status, HealthStatus::Unhealthy);
    assert_eq!(state.retry_count, 1);
}

#[tokio::test]
async fn test_非可用性错误_状态不变() {
    let (monitor, backend, _cache) = setup(HealthMonitorConfig::default());
    backend.script_health(vec![Err(BackendError::validation("Invalid quantity: 0"))]);

    let state = monitor.check_now().await;
    assert_eq!(state.status, HealthStatus::Healthy);
    assert_eq!(state.retry_count, 0);
    assert!(state.last_checked_at.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_检查超时_按网络错误处理() {
    let (monitor, backend, _cache) = setup(HealthMonitorConfig {
        check_timeout_ms: 1_000,
        ..HealthMonitorConfig::default()
    });
    backend.delay_health(Duration::from_secs(10));

    let state = monitor.check_now().await;
    assert_eq!(state.status, HealthStatus::Unhealthy);
    assert_eq!(state.retry_count, 1);
}

#[tokio::test]
async fn test_服务停机与恢复() {
    let (monitor, backend, cache) = setup(HealthMonitorConfig::default());
    let generation = cache.generation();

    backend.inner().stop();
    assert_eq!(monitor.check_now().await.status, HealthStatus::Unhealthy);

    backend.inner().start();
    assert_eq!(monitor.check_now().await.status, HealthStatus::Healthy);
    assert_eq!(cache.generation(), generation + 1);
}

#[tokio::test]
async fn test_订阅状态变化() {
    let (monitor, backend, _cache) = setup(HealthMonitorConfig::default());
    let mut rx = monitor.subscribe();
    backend.script_health(vec![Err(unavailable())]);

    monitor.check_now().await;
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().status, HealthStatus::Unhealthy);
}

#[tokio::test(start_paused = true)]
async fn test_后台循环_自适应间隔与取消() {
    let (monitor, backend, _cache) = setup(HealthMonitorConfig {
        healthy_interval_ms: 10_000,
        unhealthy_interval_ms: 3_000,
        ..HealthMonitorConfig::default()
    });
    backend.script_health(vec![Err(unavailable()), Err(unavailable())]);

    let token = CancellationToken::new();
    let handle = monitor.spawn(token.clone());

    // 启动即检查一次
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(backend.calls("check_health"), 1);
    assert_eq!(monitor.current_interval(), Duration::from_millis(3_000));

    // 不健康时 3s 一次
    tokio::time::sleep(Duration::from_millis(3_000)).await;
    assert_eq!(backend.calls("check_health"), 2);
    tokio::time::sleep(Duration::from_millis(3_000)).await;
    assert_eq!(backend.calls("check_health"), 3);
    assert!(monitor.is_healthy());

    // 恢复后 10s 一次
    assert_eq!(monitor.current_interval(), Duration::from_millis(10_000));
    tokio::time::sleep(Duration::from_millis(5_000)).await;
    assert_eq!(backend.calls("check_health"), 3);

    token.cancel();
    handle.await.unwrap();
    tokio::time::sleep(Duration::from_millis(20_000)).await;
    assert_eq!(backend.calls("check_health"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_重叠检查_最后一个结束才清除检查中标记() {
    let (monitor, backend, _cache) = setup(HealthMonitorConfig::default());
    backend.delay_health(Duration::from_millis(100));

    // 定时检查 0..100ms，手动检查 50..150ms
    let (first, second, during) = tokio::join!(
        monitor.check_now(),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            monitor.check_now().await
        },
        async {
            tokio::time::sleep(Duration::from_millis(120)).await;
            monitor.state().is_checking
        },
    );

    assert!(first.is_checking);
    assert!(during);
    assert!(!second.is_checking);
    assert!(!monitor.state().is_checking);
    assert_eq!(backend.calls("check_health"), 2);
}

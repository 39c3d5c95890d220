// ==========================================
// 厨房成本控制系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 说明: 所有实例显式注入，不使用全局单例
// ==========================================

use std::sync::{Arc, Mutex, PoisonError};

use rusqlite::Connection;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::{
    BackendClient, CostApi, DashboardApi, HealthApi, ProductionApi, RawMaterialApi, RecipeApi,
};
use crate::backend::{KitchenBackend, SqliteKitchenBackend};
use crate::cache::QueryCache;
use crate::config::ConfigManager;
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::repository::ProductionHistoryRepository;
use crate::supervisor::{HealthMonitor, RetryPolicy, RetrySupervisor};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 后端服务句柄
    pub backend: Arc<dyn KitchenBackend>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 查询缓存
    pub cache: Arc<QueryCache>,

    /// 健康监测
    pub health_monitor: Arc<HealthMonitor>,

    pub raw_material_api: Arc<RawMaterialApi>,
    pub recipe_api: Arc<RecipeApi>,
    pub cost_api: Arc<CostApi>,
    pub production_api: Arc<ProductionApi>,
    pub dashboard_api: Arc<DashboardApi>,
    pub health_api: Arc<HealthApi>,

    /// 关闭信号（重试与后台任务共用）
    shutdown: CancellationToken,

    /// 后台任务句柄
    background_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl AppState {
    /// 创建新的AppState实例（本地 SQLite 后端）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = Self::open_shared(&db_path)?;
        let backend: Arc<dyn KitchenBackend> =
            Arc::new(SqliteKitchenBackend::from_connection(conn.clone()));

        Self::build(db_path, conn, backend)
    }

    /// 使用外部后端创建（配置与生产历史仍存于本地数据库）
    pub fn with_backend(db_path: String, backend: Arc<dyn KitchenBackend>) -> Result<Self, String> {
        tracing::info!("初始化AppState（外部后端），数据库路径: {}", db_path);

        let conn = Self::open_shared(&db_path)?;
        Self::build(db_path, conn, backend)
    }

    fn open_shared(db_path: &str) -> Result<Arc<Mutex<Connection>>, String> {
        let conn = open_sqlite_connection(db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        ensure_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;
        Ok(Arc::new(Mutex::new(conn)))
    }

    fn build(
        db_path: String,
        conn: Arc<Mutex<Connection>>,
        backend: Arc<dyn KitchenBackend>,
    ) -> Result<Self, String> {
        // ==========================================
        // 配置
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let retry_config = config_manager
            .get_retry_config()
            .map_err(|e| format!("读取重试配置失败: {}", e))?;
        let health_config = config_manager
            .get_health_monitor_config()
            .map_err(|e| format!("读取健康监测配置失败: {}", e))?;
        tracing::debug!(?retry_config, ?health_config, "可用性监督配置已加载");

        // ==========================================
        // 共享资源
        // ==========================================
        let shutdown = CancellationToken::new();
        let cache = Arc::new(QueryCache::new());
        let history_repo = Arc::new(ProductionHistoryRepository::from_connection(conn));

        let client = BackendClient::new(
            backend.clone(),
            RetrySupervisor::new(RetryPolicy::from(retry_config)),
            cache.clone(),
            shutdown.clone(),
        );

        let health_monitor = Arc::new(HealthMonitor::new(
            backend.clone(),
            cache.clone(),
            health_config,
        ));

        // ==========================================
        // API层
        // ==========================================
        let cost_api = Arc::new(CostApi::new(client.clone()));
        let raw_material_api = Arc::new(RawMaterialApi::new(client.clone()));
        let recipe_api = Arc::new(RecipeApi::new(client.clone()));
        let production_api = Arc::new(ProductionApi::new(
            client.clone(),
            cost_api.clone(),
            history_repo.clone(),
        ));
        let dashboard_api = Arc::new(DashboardApi::new(client, history_repo));
        let health_api = Arc::new(HealthApi::new(health_monitor.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            backend,
            config_manager,
            cache,
            health_monitor,
            raw_material_api,
            recipe_api,
            cost_api,
            production_api,
            dashboard_api,
            health_api,
            shutdown,
            background_tasks: Mutex::new(Vec::new()),
        })
    }

    /// 启动后台任务（健康监测）；需在 tokio 运行时内调用
    pub fn start_background_tasks(&self) {
        let handle = self.health_monitor.spawn(self.shutdown.child_token());
        self.background_tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }

    /// 关闭信号
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// 关闭：取消所有重试与后台任务并等待退出
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        let handles: Vec<JoinHandle<()>> = std::mem::take(
            &mut *self
                .background_tasks
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!("后台任务退出异常: {}", e);
            }
        }
        tracing::info!("AppState已关闭");
    }
}

/// 获取默认数据库路径
///
/// 优先使用环境变量 KITCHEN_COST_CONTROL_DB_PATH，其次用户数据目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("KITCHEN_COST_CONTROL_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./kitchen_cost_control.db");

    if let Some(data_dir) = dirs::data_dir() {
        #[cfg(debug_assertions)]
        let dir = data_dir.join("kitchen-cost-control-dev");

        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("kitchen-cost-control");

        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("kitchen_cost_control.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let state = AppState::new(":memory:".to_string()).unwrap();
        state.start_background_tasks();
        state.shutdown().await;
        assert!(state.shutdown_token().is_cancelled());
    }
}

// ==========================================
// 厨房成本控制系统 - 核心库
// ==========================================
// 核心: 成本与生产计算引擎（单位换算、成本校正、毛利分析）
//       后端可用性监督（错误分类、退避重试、健康监测）
// 技术栈: Rust + tokio + SQLite
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 计算规则
pub mod engine;

// 后端服务接口与本地实现
pub mod backend;

// 可用性监督 - 错误分类 / 重试 / 健康监测
pub mod supervisor;

// 查询缓存
pub mod cache;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装与错误响应
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{HealthStatus, UnitType, RECIPE_CATEGORIES};

// 领域实体
pub use domain::{
    CostBreakdownLine, DashboardStats, Ingredient, ProductionRecord, ProfitAnalysis, RawMaterial,
    Recipe, RecipeCostAnalysis,
};

// 引擎
pub use engine::{ConsumptionAnalyzer, CostRecalculator, ProfitAnalyzer, UnitConverter};

// 后端
pub use backend::{BackendError, BackendErrorKind, KitchenBackend, SqliteKitchenBackend};

// 可用性监督
pub use supervisor::{ErrorKind, HealthMonitor, HealthState, RetrySupervisor};

// API
pub use api::{ApiError, ApiResult, CostApi, DashboardApi, RawMaterialApi, RecipeApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "厨房成本控制系统";

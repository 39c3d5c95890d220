// ==========================================
// 厨房成本控制系统 - 后端服务接口
// ==========================================
// 职责: 定义远端厨房服务的调用面（异步 trait）
// 实现者: SqliteKitchenBackend（本地 SQLite 复现服务契约）
// 说明: calculate_cost 返回服务端原始（未校正）成本明细
// ==========================================

pub mod error;
pub mod sqlite;

pub use error::{BackendError, BackendErrorKind, BackendResult};
pub use sqlite::SqliteKitchenBackend;

use crate::domain::cost::CostBreakdownLine;
use crate::domain::production::DashboardStats;
use crate::domain::raw_material::RawMaterial;
use crate::domain::recipe::{ProductionResult, Recipe, StoreIssueSlip};
use async_trait::async_trait;

// ==========================================
// KitchenBackend Trait
// ==========================================
// 用途: API 层通过 Arc<dyn KitchenBackend> 调用，所有调用都经过 RetrySupervisor
#[async_trait]
pub trait KitchenBackend: Send + Sync {
    // ===== 原料 =====

    /// 新增原料
    ///
    /// # 返回
    /// - Ok(u64): 服务端分配的原料 id
    async fn add_raw_material(
        &self,
        raw_material_name: String,
        unit_type: String,
        price_per_unit: f64,
    ) -> BackendResult<u64>;

    async fn edit_raw_material(
        &self,
        id: u64,
        raw_material_name: String,
        unit_type: String,
        price_per_unit: f64,
    ) -> BackendResult<()>;

    async fn delete_raw_material(&self, id: u64) -> BackendResult<()>;

    async fn get_all_raw_materials(&self) -> BackendResult<Vec<RawMaterial>>;

    async fn get_raw_material(&self, id: u64) -> BackendResult<Option<RawMaterial>>;

    // ===== 菜谱 =====

    /// 新增或覆盖菜谱（按名称）
    async fn add_recipe(&self, recipe: Recipe) -> BackendResult<()>;

    async fn get_all_categories(&self) -> BackendResult<Vec<String>>;

    async fn get_recipes_by_category(&self, category: String) -> BackendResult<Vec<String>>;

    // ===== 计算 =====

    /// 按产量放大配料用量
    async fn calculate_production(
        &self,
        recipe_name: String,
        quantity: f64,
    ) -> BackendResult<ProductionResult>;

    /// 原始成本明细（breakdown[i] 对应 ingredients[i]，单位未换算）
    async fn calculate_cost(
        &self,
        recipe_name: String,
        quantity: f64,
    ) -> BackendResult<Vec<CostBreakdownLine>>;

    /// 生成出库单（同时记入生产日志）
    async fn get_store_issue_slip(
        &self,
        recipe_name: String,
        quantity: f64,
    ) -> BackendResult<StoreIssueSlip>;

    async fn get_dashboard_stats(&self) -> BackendResult<DashboardStats>;

    // ===== 系统 =====

    /// 健康检查（Ok(false) 视为服务不可用）
    async fn check_health(&self) -> BackendResult<bool>;

    /// 初始化管理员（幂等）
    async fn setup_admin(&self) -> BackendResult<()>;
}

// ==========================================
// 厨房成本控制系统 - API层
// ==========================================
// 职责: 面向 UI 的业务接口；所有后端调用经 BackendClient（重试 + 缓存）
// ==========================================

pub mod client;
pub mod cost_api;
pub mod dashboard_api;
pub mod error;
pub mod health_api;
pub mod production_api;
pub mod raw_material_api;
pub mod recipe_api;

pub use client::BackendClient;
pub use cost_api::{CostApi, CostReport, CostReportLine};
pub use dashboard_api::{DashboardApi, ProductionSummary};
pub use error::{ApiError, ApiResult};
pub use health_api::{ConnectionStatus, HealthApi};
pub use production_api::{IngredientLine, ProductionApi, ProductionSheet, StoreIssueSlipView};
pub use raw_material_api::{RawMaterialApi, RawMaterialForm};
pub use recipe_api::RecipeApi;

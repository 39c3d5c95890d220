// ==========================================
// 厨房成本控制系统 - 领域层
// ==========================================
// 职责: 定义实体与值类型，不含 IO
// ==========================================

pub mod cost;
pub mod production;
pub mod raw_material;
pub mod recipe;
pub mod types;

// 重导出核心类型
pub use cost::{CostBreakdownLine, ProfitAnalysis, RecipeCostAnalysis};
pub use production::{ConsumedIngredient, DashboardStats, ProductionRecord};
pub use raw_material::RawMaterial;
pub use recipe::{Ingredient, ProductionResult, Recipe, StoreIssueSlip};
pub use types::{HealthStatus, UnitType, RECIPE_CATEGORIES};

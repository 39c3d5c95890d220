// ==========================================
// 厨房成本控制系统 - 引擎层
// ==========================================
// 职责: 成本与产量计算规则（纯计算，不访问后端/数据库）
// ==========================================

pub mod consumption;
pub mod cost_recalc;
pub mod error;
pub mod profit;
pub mod unit_converter;

// 重导出核心引擎
pub use consumption::{ConsumptionAnalyzer, IngredientConsumption};
pub use cost_recalc::CostRecalculator;
pub use error::{EngineError, EngineResult};
pub use profit::ProfitAnalyzer;
pub use unit_converter::{format_currency, format_number, UnitConverter};

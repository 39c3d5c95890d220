// ==========================================
// 厨房成本控制系统 - 成本分析模型
// ==========================================
// 红线: breakdown[i] 与 recipe.ingredients[i] 按位置对应（非按键关联）
// ==========================================

use serde::{Deserialize, Serialize};

/// 单个配料的成本行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdownLine {
    pub cost_per_unit: f64,
    pub total_cost: f64,
}

/// 菜谱批次成本分析
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeCostAnalysis {
    pub breakdown: Vec<CostBreakdownLine>,
    pub total_batch_cost: f64,
    pub cost_per_portion: f64,
}

/// 毛利分析（由每份成本与售价派生）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfitAnalysis {
    pub profit_per_portion: f64,
    pub profit_percentage: f64,
    pub food_cost_percentage: f64,
}

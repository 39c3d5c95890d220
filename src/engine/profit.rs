// ==========================================
// 厨房成本控制系统 - 毛利分析引擎
// ==========================================
// 规则: 售价为 0 时，毛利率与食材成本率均定义为 0（不产生 NaN）
// ==========================================

use crate::domain::cost::ProfitAnalysis;

// ==========================================
// ProfitAnalyzer - 毛利分析
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfitAnalyzer;

impl ProfitAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// 由每份成本与售价派生毛利指标
    ///
    /// - profit_per_portion = 售价 - 每份成本
    /// - profit_percentage = 售价 == 0 ? 0 : 每份毛利 / 售价 × 100
    /// - food_cost_percentage = 售价 == 0 ? 0 : 每份成本 / 售价 × 100
    pub fn analyze(&self, cost_per_portion: f64, selling_price: f64) -> ProfitAnalysis {
        let profit_per_portion = selling_price - cost_per_portion;

        if selling_price == 0.0 {
            return ProfitAnalysis {
                profit_per_portion,
                profit_percentage: 0.0,
                food_cost_percentage: 0.0,
            };
        }

        ProfitAnalysis {
            profit_per_portion,
            profit_percentage: profit_per_portion / selling_price * 100.0,
            food_cost_percentage: cost_per_portion / selling_price * 100.0,
        }
    }
}

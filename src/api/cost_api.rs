// ==========================================
// 厨房成本控制系统 - 成本分析 API
// ==========================================
// 流程:
// 1) calculate_production(name, 1) 取单份配方
// 2) 原料价目表（缓存）→ 缺价前置校验
// 3) calculate_cost(name, quantity) 取后端原始明细
// 4) CostRecalculator 按位置校正 → ProfitAnalyzer 计算毛利
// ==========================================

use crate::api::client::BackendClient;
use crate::api::error::{ApiError, ApiResult};
use crate::domain::cost::{CostBreakdownLine, ProfitAnalysis, RecipeCostAnalysis};
use crate::domain::raw_material::RawMaterial;
use crate::domain::recipe::Ingredient;
use crate::engine::{format_currency, CostRecalculator, EngineError, ProfitAnalyzer, UnitConverter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// 成本报表行（展示用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostReportLine {
    pub raw_material_name: String,
    pub quantity_display: String, // 本批次用量，如 "1.5 Kg"
    pub cost_per_unit: f64,
    pub total_cost: f64,
    pub total_cost_display: String, // 如 "₹90.00"
}

/// 成本与毛利报表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostReport {
    pub recipe_name: String,
    pub quantity: f64,
    pub selling_price: f64,
    pub analysis: RecipeCostAnalysis,
    pub profit: ProfitAnalysis,
    pub lines: Vec<CostReportLine>,
}

/// 校正结果及其计算输入
pub(crate) struct CostComputation {
    pub ingredients: Vec<Ingredient>, // 单份配方
    pub raw_materials: HashMap<u64, RawMaterial>,
    pub analysis: RecipeCostAnalysis,
}

pub struct CostApi {
    client: BackendClient,
    recalculator: CostRecalculator,
    profit_analyzer: ProfitAnalyzer,
    converter: UnitConverter,
}

impl CostApi {
    pub fn new(client: BackendClient) -> Self {
        Self {
            client,
            recalculator: CostRecalculator::new(),
            profit_analyzer: ProfitAnalyzer::new(),
            converter: UnitConverter::new(),
        }
    }

    /// 计算校正后的成本
    ///
    /// # 错误
    /// - Calculation(InvalidQuantity): 份数 <= 0
    /// - MissingCosts: 存在未设置单价的原料
    /// - NoCostData: 后端未返回任何明细
    pub async fn calculate_cost(&self, recipe_name: &str, quantity: f64) -> ApiResult<RecipeCostAnalysis> {
        Ok(self.compute(recipe_name, quantity).await?.analysis)
    }

    #[instrument(skip(self))]
    pub(crate) async fn compute(&self, recipe_name: &str, quantity: f64) -> ApiResult<CostComputation> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(EngineError::InvalidQuantity(quantity).into());
        }

        let production = self
            .client
            .call("calculate_production", |b| {
                let name = recipe_name.to_string();
                async move { b.calculate_production(name, 1.0).await }
            })
            .await?;
        let ingredients = production.ingredients;

        let raw_materials = CostRecalculator::index_by_id(&self.client.raw_materials().await?);

        let missing = self.recalculator.find_missing_costs(&ingredients, &raw_materials);
        if !missing.is_empty() {
            debug!(?missing, "存在未设置单价的原料");
            return Err(ApiError::MissingCosts { names: missing });
        }

        let raw_breakdown: Vec<CostBreakdownLine> = self
            .client
            .call("calculate_cost", |b| {
                let name = recipe_name.to_string();
                async move { b.calculate_cost(name, quantity).await }
            })
            .await?;
        if raw_breakdown.is_empty() {
            return Err(ApiError::NoCostData);
        }

        let analysis =
            self.recalculator
                .recompute(&ingredients, &raw_materials, &raw_breakdown, quantity)?;

        Ok(CostComputation {
            ingredients,
            raw_materials,
            analysis,
        })
    }

    /// 毛利分析（纯计算）
    pub fn analyze_profit(&self, cost_per_portion: f64, selling_price: f64) -> ProfitAnalysis {
        self.profit_analyzer.analyze(cost_per_portion, selling_price)
    }

    /// 成本与毛利报表
    pub async fn cost_report(
        &self,
        recipe_name: &str,
        quantity: f64,
        selling_price: f64,
    ) -> ApiResult<CostReport> {
        let computation = self.compute(recipe_name, quantity).await?;
        let profit = self.analyze_profit(computation.analysis.cost_per_portion, selling_price);

        let lines = computation
            .ingredients
            .iter()
            .zip(&computation.analysis.breakdown)
            .map(|(ing, line)| {
                let name = computation
                    .raw_materials
                    .get(&ing.raw_material_id)
                    .map(|rm| rm.raw_material_name.clone())
                    .unwrap_or_else(|| format!("ID: {}", ing.raw_material_id));
                CostReportLine {
                    raw_material_name: name,
                    quantity_display: self
                        .converter
                        .format_quantity(ing.quantity_per_portion * quantity, &ing.unit),
                    cost_per_unit: line.cost_per_unit,
                    total_cost: line.total_cost,
                    total_cost_display: format_currency(line.total_cost),
                }
            })
            .collect();

        Ok(CostReport {
            recipe_name: recipe_name.to_string(),
            quantity,
            selling_price,
            analysis: computation.analysis,
            profit,
            lines,
        })
    }
}

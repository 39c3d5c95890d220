// ==========================================
// 厨房成本控制系统 - 生产消耗统计引擎
// ==========================================
// 职责: 基于本地生产历史计算原料消耗汇总、Top 原料、总成本
// 说明: 按原料名聚合；历史记录落库时已换算为原料计价单位（g→Kg、ml→L），同名原料单位一致
// ==========================================

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::production::ProductionRecord;

/// Top 原料默认数量
pub const TOP_INGREDIENT_LIMIT: usize = 5;

/// 原料消耗汇总项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientConsumption {
    pub name: String,
    pub quantity: f64,
}

// ==========================================
// ConsumptionAnalyzer - 消耗统计
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsumptionAnalyzer;

impl ConsumptionAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// 按原料名汇总总消耗
    pub fn total_consumption(&self, records: &[ProductionRecord]) -> HashMap<String, f64> {
        let mut consumption: HashMap<String, f64> = HashMap::new();
        for record in records {
            for ingredient in &record.ingredients {
                *consumption.entry(ingredient.name.clone()).or_insert(0.0) += ingredient.quantity;
            }
        }
        consumption
    }

    /// 消耗量最高的原料（降序，同量按名称排序）
    pub fn top_ingredients(&self, records: &[ProductionRecord], limit: usize) -> Vec<IngredientConsumption> {
        let mut items: Vec<IngredientConsumption> = self
            .total_consumption(records)
            .into_iter()
            .map(|(name, quantity)| IngredientConsumption { name, quantity })
            .collect();

        items.sort_by(|a, b| {
            b.quantity
                .total_cmp(&a.quantity)
                .then_with(|| a.name.cmp(&b.name))
        });
        items.truncate(limit);
        items
    }

    /// 生产总成本
    pub fn total_cost(&self, records: &[ProductionRecord]) -> f64 {
        records.iter().map(|r| r.cost).sum()
    }

    /// 筛选某日的生产记录
    pub fn records_on<'a>(&self, records: &'a [ProductionRecord], date: NaiveDate) -> Vec<&'a ProductionRecord> {
        records
            .iter()
            .filter(|r| r.production_date() == date)
            .collect()
    }
}

// ==========================================
// 厨房成本控制系统 - 生产记录与驾驶舱统计
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ProductionRecord - 本地生产历史记录
// ==========================================
// 用途: 本地便利缓存，非事实来源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    pub record_id: String,          // 记录 ID（UUID）
    pub produced_at: DateTime<Utc>, // 生产时间
    pub recipe_name: String,
    pub quantity: f64,  // 生产份数
    pub cost: f64,      // 本批次成本（已校正）
    pub ingredients: Vec<ConsumedIngredient>,
}

impl ProductionRecord {
    /// 记录所属的生产日期（UTC）
    pub fn production_date(&self) -> NaiveDate {
        self.produced_at.date_naive()
    }
}

/// 生产记录中的单个原料消耗
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumedIngredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

// ==========================================
// DashboardStats - 驾驶舱统计（后端提供）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_recipes: u64,
    pub total_ingredients: u64,
    pub most_produced_item: String,
    pub average_food_cost_percentage: f64,
}

impl Default for DashboardStats {
    fn default() -> Self {
        Self {
            total_recipes: 0,
            total_ingredients: 0,
            most_produced_item: String::new(),
            average_food_cost_percentage: 0.0,
        }
    }
}

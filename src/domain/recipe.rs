// ==========================================
// 厨房成本控制系统 - 菜谱领域模型
// ==========================================
// 说明: 菜谱以名称作为后端检索键（非结构化 id）
// 获取路径: 分类列表 → 分类下菜谱名 → calculate_production(name, 1) 取配料明细
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Ingredient - 菜谱配料行
// ==========================================
// 配料单位可能与原料计价单位不同，计价前需要换算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub raw_material_id: u64,      // 引用的原料 id
    pub quantity_per_portion: f64, // 每份用量（非负）
    pub unit: String,              // 配料单位（g/Kg/ml/L/Nos）
}

// ==========================================
// Recipe - 菜谱
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    pub category: String,
    pub portion_weight: f64, // 每份重量（克）
    pub ingredients: Vec<Ingredient>,
}

// ==========================================
// ProductionResult - 产量放大结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionResult {
    pub total_portion_weight: f64,
    pub ingredients: Vec<Ingredient>, // quantity_per_portion 已按产量放大
}

// ==========================================
// StoreIssueSlip - 领料单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreIssueSlip {
    pub date: String,
    pub recipe_name: String,
    pub production_quantity: f64,
    pub ingredients: Vec<Ingredient>, // 本次生产的总用量
}

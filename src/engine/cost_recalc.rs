// ==========================================
// 厨房成本控制系统 - 成本重算引擎
// ==========================================
// 背景: 后端 calculate_cost 直接用未换算的配料数量乘单价（g 乘 ₹/Kg），
//       总价偏大 1000 倍；客户端按位置逐行校正总价
// 红线: breakdown[i] 必须对应 ingredients[i]；行数不一致视为错误而非猜测
// ==========================================
// 输入: 菜谱配料 + 原料价目表 + 后端原始明细 + 生产份数
// 输出: 校正后的 RecipeCostAnalysis
// ==========================================

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::domain::cost::{CostBreakdownLine, RecipeCostAnalysis};
use crate::domain::raw_material::RawMaterial;
use crate::domain::recipe::Ingredient;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::unit_converter::UnitConverter;

// ==========================================
// CostRecalculator - 成本重算引擎
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CostRecalculator {
    converter: UnitConverter,
}

impl CostRecalculator {
    pub fn new() -> Self {
        Self {
            converter: UnitConverter::new(),
        }
    }

    /// 按 id 建立原料索引
    pub fn index_by_id(raw_materials: &[RawMaterial]) -> HashMap<u64, RawMaterial> {
        raw_materials
            .iter()
            .map(|rm| (rm.id, rm.clone()))
            .collect()
    }

    /// 重算校正后的成本
    ///
    /// 步骤:
    /// 1) ingredients[i] 与 raw_breakdown[i] 配对
    /// 2) 原料不存在 → 原始行原样透传（降级但不失败）
    /// 3) 总用量 = 每份用量 × 份数，换算到原料计价单位
    /// 4) 行总价 = 换算后用量 × 单价；cost_per_unit 直接取原料单价
    /// 5) 批次总价 = Σ 行总价；每份成本 = 批次总价 / 份数
    ///
    /// # 错误
    /// - InvalidQuantity: quantity <= 0 或非有限数
    /// - BreakdownLengthMismatch: 明细行数与配料行数不一致
    #[instrument(skip(self, ingredients, raw_materials, raw_breakdown), fields(lines = ingredients.len()))]
    pub fn recompute(
        &self,
        ingredients: &[Ingredient],
        raw_materials: &HashMap<u64, RawMaterial>,
        raw_breakdown: &[CostBreakdownLine],
        quantity: f64,
    ) -> EngineResult<RecipeCostAnalysis> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(EngineError::InvalidQuantity(quantity));
        }
        if raw_breakdown.len() != ingredients.len() {
            return Err(EngineError::BreakdownLengthMismatch {
                expected: ingredients.len(),
                actual: raw_breakdown.len(),
            });
        }

        let breakdown: Vec<CostBreakdownLine> = ingredients
            .iter()
            .zip(raw_breakdown)
            .map(|(ingredient, raw_line)| {
                let raw_material = raw_materials.get(&ingredient.raw_material_id);
                self.correct_line(ingredient, raw_material, raw_line, quantity)
            })
            .collect();

        let total_batch_cost: f64 = breakdown.iter().map(|line| line.total_cost).sum();
        let cost_per_portion = total_batch_cost / quantity;

        debug!(total_batch_cost, cost_per_portion, "成本重算完成");

        Ok(RecipeCostAnalysis {
            breakdown,
            total_batch_cost,
            cost_per_portion,
        })
    }

    /// 校正单个配料行
    pub fn correct_line(
        &self,
        ingredient: &Ingredient,
        raw_material: Option<&RawMaterial>,
        raw_line: &CostBreakdownLine,
        quantity: f64,
    ) -> CostBreakdownLine {
        let raw_material = match raw_material {
            Some(rm) => rm,
            None => {
                debug!(
                    raw_material_id = ingredient.raw_material_id,
                    "原料不存在，透传后端原始明细"
                );
                return raw_line.clone();
            }
        };

        let total_ingredient_qty = ingredient.quantity_per_portion * quantity;
        let converted_qty =
            self.converter
                .convert(total_ingredient_qty, &ingredient.unit, &raw_material.unit_type);

        CostBreakdownLine {
            cost_per_unit: raw_material.price_per_unit,
            total_cost: converted_qty * raw_material.price_per_unit,
        }
    }

    /// 前置校验: 找出未设置单价的原料
    ///
    /// 原料不存在或单价 <= 0 均视为缺失；
    /// 返回原料名称（未知 id 显示为 "ID: n"），按配料顺序、去重
    pub fn find_missing_costs(
        &self,
        ingredients: &[Ingredient],
        raw_materials: &HashMap<u64, RawMaterial>,
    ) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for ingredient in ingredients {
            let name = match raw_materials.get(&ingredient.raw_material_id) {
                Some(rm) if rm.has_price() => continue,
                Some(rm) => rm.raw_material_name.clone(),
                None => format!("ID: {}", ingredient.raw_material_id),
            };
            if !missing.contains(&name) {
                missing.push(name);
            }
        }
        missing
    }
}

// ==========================================
// 厨房成本控制系统 - 原料领域模型
// ==========================================
// 用途: 后端服务返回的原料主数据（带单价与计价单位）
// 红线: id 由后端分配，客户端不生成 id
// ==========================================

use crate::domain::types::UnitType;
use serde::{Deserialize, Serialize};

// ==========================================
// RawMaterial - 原料主数据
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMaterial {
    pub id: u64,                   // 后端分配的不透明 id
    pub raw_material_name: String, // 展示名（大小写不敏感唯一）
    pub unit_type: String,         // 计价单位（Kg/L/g/ml/Nos，或历史值 Liter/Piece）
    pub price_per_unit: f64,       // 单价（非负）
}

impl RawMaterial {
    /// 解析后的计价单位（历史/未知值返回 None）
    pub fn unit(&self) -> Option<UnitType> {
        UnitType::parse(&self.unit_type)
    }

    /// 是否已设置有效单价（严格大于 0）
    pub fn has_price(&self) -> bool {
        self.price_per_unit.is_finite() && self.price_per_unit > 0.0
    }

    /// 名称是否与给定名称重复（忽略大小写与首尾空白）
    pub fn name_matches(&self, name: &str) -> bool {
        self.raw_material_name.trim().to_lowercase() == name.trim().to_lowercase()
    }
}

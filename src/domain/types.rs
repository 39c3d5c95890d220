// ==========================================
// 厨房成本控制系统 - 领域类型定义
// ==========================================
// 职责: 计量单位、健康状态、菜谱分类等基础枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 计量单位 (Unit Type)
// ==========================================
// 原料主数据的计价单位；菜谱配料行的单位可能与之不同（g vs Kg, ml vs L）
// 兼容历史数据: Liter ≡ L, Piece ≡ Nos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitType {
    #[serde(rename = "Kg")]
    Kg, // 千克
    #[serde(rename = "L")]
    L, // 升
    #[serde(rename = "g")]
    G, // 克
    #[serde(rename = "ml")]
    Ml, // 毫升
    #[serde(rename = "Nos")]
    Nos, // 个/件
}

impl UnitType {
    /// 原料表单可选的全部单位（按展示顺序）
    pub const ALL: [UnitType; 5] = [
        UnitType::Kg,
        UnitType::L,
        UnitType::G,
        UnitType::Ml,
        UnitType::Nos,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Kg => "Kg",
            UnitType::L => "L",
            UnitType::G => "g",
            UnitType::Ml => "ml",
            UnitType::Nos => "Nos",
        }
    }

    /// 解析单位字符串（大小写不敏感，含历史别名）
    ///
    /// # 返回
    /// - Some(UnitType): 可识别的单位
    /// - None: 未知单位
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "kg" => Some(UnitType::Kg),
            "l" | "liter" | "litre" => Some(UnitType::L),
            "g" => Some(UnitType::G),
            "ml" => Some(UnitType::Ml),
            "nos" | "piece" | "pcs" => Some(UnitType::Nos),
            _ => None,
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 后端健康状态 (Health Status)
// ==========================================
// 初始为 Healthy（乐观假设），仅由 HealthMonitor 的轮询结果修改
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

// ==========================================
// 菜谱分类预设
// ==========================================
pub const RECIPE_CATEGORIES: [&str; 13] = [
    "Tiffin",
    "Lunch",
    "Snacks",
    "Chat",
    "Chinese",
    "Soup",
    "Bread",
    "Gravy",
    "Chutney",
    "Juice",
    "Wellness Bowl",
    "Special Item",
    "Other",
];

/// 是否为预设分类（精确匹配）
pub fn is_known_category(category: &str) -> bool {
    RECIPE_CATEGORIES.contains(&category)
}

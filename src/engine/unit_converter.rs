// ==========================================
// 厨房成本控制系统 - 单位换算引擎
// ==========================================
// 规则: 仅支持 g→Kg、ml→L（1000:1），其余组合视为单位已兼容原样返回
// 说明: 这是已知的近似处理，不是通用单位代数
// ==========================================

use crate::domain::types::UnitType;

/// 公制换算比例
pub const METRIC_FACTOR: f64 = 1000.0;

/// 展示时数量保留的最大小数位
pub const QUANTITY_DECIMALS: usize = 3;

// ==========================================
// UnitConverter - 单位换算
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitConverter;

impl UnitConverter {
    pub fn new() -> Self {
        Self
    }

    /// 将配料数量换算到原料计价单位
    ///
    /// 规则（按优先级）:
    /// 1) g → Kg: ÷1000
    /// 2) ml → L（含历史单位 Liter）: ÷1000
    /// 3) 其他: 原样返回（不报错，尽力换算）
    pub fn convert(&self, quantity: f64, from_unit: &str, to_unit: &str) -> f64 {
        match (UnitType::parse(from_unit), UnitType::parse(to_unit)) {
            (Some(UnitType::G), Some(UnitType::Kg)) => quantity / METRIC_FACTOR,
            (Some(UnitType::Ml), Some(UnitType::L)) => quantity / METRIC_FACTOR,
            _ => quantity,
        }
    }

    /// 展示用反向换算: >= 1000 g 显示为 Kg，>= 1000 ml 显示为 L
    ///
    /// # 返回
    /// - (展示数值, 展示单位)
    pub fn to_display(&self, value: f64, unit: &str) -> (f64, String) {
        match UnitType::parse(unit) {
            Some(UnitType::G) if value >= METRIC_FACTOR => {
                (value / METRIC_FACTOR, UnitType::Kg.as_str().to_string())
            }
            Some(UnitType::Ml) if value >= METRIC_FACTOR => {
                (value / METRIC_FACTOR, UnitType::L.as_str().to_string())
            }
            _ => (value, unit.to_string()),
        }
    }

    /// 格式化数量（自动升级单位），如 "1.5 Kg"、"750 g"
    pub fn format_quantity(&self, value: f64, unit: &str) -> String {
        let (display_value, display_unit) = self.to_display(value, unit);
        format!("{} {}", format_number(display_value), display_unit)
    }
}

/// 最多保留 3 位小数并去掉末尾的 0
pub fn format_number(value: f64) -> String {
    let fixed = format!("{:.*}", QUANTITY_DECIMALS, value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// 货币展示（₹，两位小数）
pub fn format_currency(value: f64) -> String {
    format!("₹{:.2}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_克到千克() {
        let converter = UnitConverter::new();
        assert_eq!(converter.convert(1000.0, "g", "Kg"), 1.0);
        assert_eq!(converter.convert(500.0, "g", "Kg"), 0.5);
    }

    #[test]
    fn test_convert_毫升到升_含历史单位() {
        let converter = UnitConverter::new();
        assert_eq!(converter.convert(300.0, "ml", "L"), 0.3);
        assert_eq!(converter.convert(2500.0, "ml", "Liter"), 2.5);
    }

    #[test]
    fn test_convert_未映射单位原样返回() {
        let converter = UnitConverter::new();
        assert_eq!(converter.convert(7.0, "pcs", "Nos"), 7.0);
        assert_eq!(converter.convert(2.0, "Kg", "Kg"), 2.0);
        // 反方向不换算（已知近似）
        assert_eq!(converter.convert(2.0, "Kg", "g"), 2.0);
        assert_eq!(converter.convert(3.0, "cup", "L"), 3.0);
    }

    #[test]
    fn test_to_display_阈值() {
        let converter = UnitConverter::new();
        assert_eq!(converter.to_display(1000.0, "g"), (1.0, "Kg".to_string()));
        assert_eq!(converter.to_display(999.0, "g"), (999.0, "g".to_string()));
        assert_eq!(converter.to_display(1500.0, "ml"), (1.5, "L".to_string()));
        assert_eq!(converter.to_display(4.0, "Nos"), (4.0, "Nos".to_string()));
    }

    #[test]
    fn test_format_quantity() {
        let converter = UnitConverter::new();
        assert_eq!(converter.format_quantity(1500.0, "g"), "1.5 Kg");
        assert_eq!(converter.format_quantity(750.0, "g"), "750 g");
        assert_eq!(converter.format_quantity(0.12345, "Kg"), "0.123 Kg");
    }

    #[test]
    fn test_format_number_and_currency() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(-0.0001), "0");
        assert_eq!(format_currency(180.0), "₹180.00");
        assert_eq!(format_currency(2.346), "₹2.35");
    }
}

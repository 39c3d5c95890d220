// ==========================================
// 厨房成本控制系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 计算引擎错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// 后端成本明细行数与菜谱配料行数不一致（位置对应关系失效）
    #[error("Invalid cost breakdown: expected {expected} lines for the recipe ingredients, got {actual}")]
    BreakdownLengthMismatch { expected: usize, actual: usize },

    /// 生产数量非法（<= 0 或非有限数），每份成本无定义
    #[error("Invalid production quantity: {0}")]
    InvalidQuantity(f64),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;

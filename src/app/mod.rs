// ==========================================
// 厨房成本控制系统 - 应用层
// ==========================================
// 职责: 组装共享状态，映射前端错误响应
// ==========================================

pub mod error_response;
pub mod state;

// 重导出
pub use error_response::{map_api_error, map_api_error_in, map_api_error_json, ErrorResponse};
pub use state::{get_default_db_path, AppState};

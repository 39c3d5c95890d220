// ==========================================
// 厨房成本控制系统 - 仓储层
// ==========================================
// 职责: SQLite 持久化，不含业务规则
// 所有仓储共享同一个 Arc<Mutex<Connection>>
// ==========================================

pub mod admin_repo;
pub mod error;
pub mod production_history_repo;
pub mod raw_material_repo;
pub mod recipe_repo;

pub use admin_repo::AdminRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use production_history_repo::ProductionHistoryRepository;
pub use raw_material_repo::RawMaterialRepository;
pub use recipe_repo::RecipeRepository;

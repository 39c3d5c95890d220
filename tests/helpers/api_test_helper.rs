// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 组装临时数据库 + 可编排故障后端 + AppState
// ==========================================

#[path = "../test_helpers.rs"]
mod test_helpers;

use std::error::Error;
use std::sync::Arc;
use tempfile::NamedTempFile;

use kitchen_cost_control::api::RawMaterialForm;
use kitchen_cost_control::app::AppState;
use kitchen_cost_control::backend::SqliteKitchenBackend;
use kitchen_cost_control::config::{config_keys, ConfigManager};

use super::flaky_backend::FlakyBackend;
use super::test_data_builder::RecipeBuilder;

/// 菜谱 "Veg Pulao" 的配料 id
pub struct SeededKitchen {
    pub oil_id: u64,
    pub rice_id: u64,
}

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 后端为包装了本地 SQLite 的 FlakyBackend；重试退避缩短到毫秒级
pub struct KitchenTestEnv {
    pub db_path: String,
    pub state: AppState,
    pub backend: Arc<FlakyBackend>,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl KitchenTestEnv {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        Self::with_retry(10, 40, 5)
    }

    /// 指定重试参数创建测试环境
    pub fn with_retry(base_delay_ms: u64, max_delay_ms: u64, max_retries: u32) -> Result<Self, Box<dyn Error>> {
        let (temp_file, db_path) = test_helpers::create_test_db()?;

        let config = ConfigManager::new(&db_path)?;
        config.set_global_config_value(config_keys::RETRY_BASE_DELAY_MS, &base_delay_ms.to_string())?;
        config.set_global_config_value(config_keys::RETRY_MAX_DELAY_MS, &max_delay_ms.to_string())?;
        config.set_global_config_value(config_keys::RETRY_MAX_ATTEMPTS, &max_retries.to_string())?;
        drop(config);

        let inner = Arc::new(SqliteKitchenBackend::new(&db_path)?);
        let backend = Arc::new(FlakyBackend::new(inner));
        let state = AppState::with_backend(db_path.clone(), backend.clone())?;

        Ok(Self {
            db_path,
            state,
            backend,
            _temp_file: temp_file,
        })
    }

    /// 初始化管理员并录入一个原料
    pub async fn add_raw_material(&self, name: &str, unit: &str, price: &str) -> u64 {
        self.state
            .raw_material_api
            .add_raw_material(&RawMaterialForm::new(name, unit, price))
            .await
            .expect("录入原料失败")
    }

    /// 标准数据: 葵花籽油 ₹200/L、香米 ₹60/Kg，菜谱 Veg Pulao 每份 300 ml 油 + 2 Kg 米
    pub async fn seed_kitchen(&self) -> SeededKitchen {
        use kitchen_cost_control::backend::KitchenBackend;

        self.backend.inner().setup_admin().await.expect("管理员初始化失败");
        let oil_id = self.add_raw_material("Sunflower Oil", "L", "200").await;
        let rice_id = self.add_raw_material("Basmati Rice", "Kg", "60").await;

        let recipe = RecipeBuilder::new("Veg Pulao")
            .category("Lunch")
            .portion_weight(350.0)
            .ingredient(oil_id, 300.0, "ml")
            .ingredient(rice_id, 2.0, "Kg")
            .build();
        self.state
            .recipe_api
            .save_recipe(&recipe)
            .await
            .expect("保存菜谱失败");

        SeededKitchen { oil_id, rice_id }
    }
}

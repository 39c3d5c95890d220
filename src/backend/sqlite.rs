// ==========================================
// 厨房成本控制系统 - SQLite 后端实现
// ==========================================
// 职责: 在本地 SQLite 上复现厨房服务的调用契约
// 说明:
// - 校验错误沿用服务端文本（分类器依赖这些文本）
// - calculate_cost 不做单位换算（服务端已知缺陷，由 CostRecalculator 校正）
// - stop()/start() 模拟服务停机（IC0508）
// ==========================================

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::KitchenBackend;
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::cost::CostBreakdownLine;
use crate::domain::production::DashboardStats;
use crate::domain::raw_material::RawMaterial;
use crate::domain::recipe::{Ingredient, ProductionResult, Recipe, StoreIssueSlip};
use crate::domain::types::UnitType;
use crate::repository::{
    AdminRepository, RawMaterialRepository, RecipeRepository, RepositoryError,
};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::Connection;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument};

/// 停机时返回的错误文本
pub const STOPPED_MESSAGE: &str = "IC0508: Canister is stopped";

// ==========================================
// SqliteKitchenBackend
// ==========================================
pub struct SqliteKitchenBackend {
    raw_materials: RawMaterialRepository,
    recipes: RecipeRepository,
    admin: AdminRepository,
    stopped: AtomicBool,
}

impl SqliteKitchenBackend {
    /// 打开（或创建）数据库文件并初始化表结构
    pub fn new(db_path: &str) -> BackendResult<Self> {
        let conn = open_sqlite_connection(db_path).map_err(RepositoryError::from)?;
        ensure_schema(&conn).map_err(RepositoryError::from)?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 从共享连接创建（调用方负责 ensure_schema）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            raw_materials: RawMaterialRepository::from_connection(conn.clone()),
            recipes: RecipeRepository::from_connection(conn.clone()),
            admin: AdminRepository::from_connection(conn),
            stopped: AtomicBool::new(false),
        }
    }

    /// 模拟服务停机：之后所有调用返回 ServiceUnavailable
    pub fn stop(&self) {
        info!("后端服务已停止");
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn start(&self) {
        info!("后端服务已启动");
        self.stopped.store(false, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    // ==========================================
    // 内部校验
    // ==========================================

    fn ensure_running(&self) -> BackendResult<()> {
        if self.is_stopped() {
            return Err(BackendError::service_unavailable(STOPPED_MESSAGE));
        }
        Ok(())
    }

    fn ensure_admin(&self) -> BackendResult<()> {
        if !self.admin.is_set_up()? {
            return Err(BackendError::auth("Admin not set up"));
        }
        Ok(())
    }

    fn validate_raw_material(
        raw_material_name: &str,
        unit_type: &str,
        price_per_unit: f64,
    ) -> BackendResult<()> {
        if raw_material_name.trim().is_empty() {
            return Err(BackendError::validation("Raw material name cannot be empty"));
        }
        if UnitType::parse(unit_type).is_none() {
            return Err(BackendError::validation(format!("Invalid unit type: {}", unit_type)));
        }
        if !price_per_unit.is_finite() {
            return Err(BackendError::validation("Invalid price per unit"));
        }
        if price_per_unit < 0.0 {
            return Err(BackendError::validation("Price per unit cannot be negative"));
        }
        Ok(())
    }

    fn validate_quantity(quantity: f64) -> BackendResult<()> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(BackendError::validation(format!("Invalid quantity: {}", quantity)));
        }
        Ok(())
    }

    fn load_recipe(&self, recipe_name: &str) -> BackendResult<Recipe> {
        self.recipes
            .find_by_name(recipe_name)?
            .ok_or_else(|| BackendError::validation("Recipe not found"))
    }

    fn scale(recipe: &Recipe, quantity: f64) -> Vec<Ingredient> {
        recipe
            .ingredients
            .iter()
            .map(|ing| Ingredient {
                raw_material_id: ing.raw_material_id,
                quantity_per_portion: ing.quantity_per_portion * quantity,
                unit: ing.unit.clone(),
            })
            .collect()
    }

    // 唯一约束冲突转换为服务端文本
    fn map_duplicate(err: RepositoryError) -> BackendError {
        match err {
            RepositoryError::UniqueConstraintViolation(_) => {
                BackendError::validation("Raw material with this name already exists")
            }
            RepositoryError::NotFound { .. } => BackendError::validation("Raw material not found"),
            other => other.into(),
        }
    }
}

#[async_trait]
impl KitchenBackend for SqliteKitchenBackend {
    #[instrument(skip(self))]
    async fn add_raw_material(
        &self,
        raw_material_name: String,
        unit_type: String,
        price_per_unit: f64,
    ) -> BackendResult<u64> {
        self.ensure_running()?;
        self.ensure_admin()?;
        Self::validate_raw_material(&raw_material_name, &unit_type, price_per_unit)?;

        let id = self
            .raw_materials
            .insert(&raw_material_name, &unit_type, price_per_unit)
            .map_err(Self::map_duplicate)?;
        debug!(id, "原料已新增");
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn edit_raw_material(
        &self,
        id: u64,
        raw_material_name: String,
        unit_type: String,
        price_per_unit: f64,
    ) -> BackendResult<()> {
        self.ensure_running()?;
        self.ensure_admin()?;
        Self::validate_raw_material(&raw_material_name, &unit_type, price_per_unit)?;

        self.raw_materials
            .update(id, &raw_material_name, &unit_type, price_per_unit)
            .map_err(Self::map_duplicate)
    }

    #[instrument(skip(self))]
    async fn delete_raw_material(&self, id: u64) -> BackendResult<()> {
        self.ensure_running()?;
        self.ensure_admin()?;
        self.raw_materials.delete(id).map_err(Self::map_duplicate)
    }

    async fn get_all_raw_materials(&self) -> BackendResult<Vec<RawMaterial>> {
        self.ensure_running()?;
        Ok(self.raw_materials.list_all()?)
    }

    async fn get_raw_material(&self, id: u64) -> BackendResult<Option<RawMaterial>> {
        self.ensure_running()?;
        Ok(self.raw_materials.find_by_id(id)?)
    }

    #[instrument(skip(self, recipe), fields(recipe = %recipe.name))]
    async fn add_recipe(&self, recipe: Recipe) -> BackendResult<()> {
        self.ensure_running()?;
        self.ensure_admin()?;

        if recipe.name.trim().is_empty() {
            return Err(BackendError::validation("Recipe name cannot be empty"));
        }
        if recipe.category.trim().is_empty() {
            return Err(BackendError::validation("Category cannot be empty"));
        }
        if !recipe.portion_weight.is_finite() || recipe.portion_weight < 0.0 {
            return Err(BackendError::validation("Portion weight cannot be negative"));
        }
        for ing in &recipe.ingredients {
            if !ing.quantity_per_portion.is_finite() || ing.quantity_per_portion < 0.0 {
                return Err(BackendError::validation("Quantity cannot be negative"));
            }
            if self.raw_materials.find_by_id(ing.raw_material_id)?.is_none() {
                return Err(BackendError::validation("Raw material not found"));
            }
        }

        self.recipes.upsert(&recipe)?;
        debug!(ingredients = recipe.ingredients.len(), "菜谱已保存");
        Ok(())
    }

    async fn get_all_categories(&self) -> BackendResult<Vec<String>> {
        self.ensure_running()?;
        Ok(self.recipes.list_categories()?)
    }

    async fn get_recipes_by_category(&self, category: String) -> BackendResult<Vec<String>> {
        self.ensure_running()?;
        Ok(self.recipes.list_names_by_category(&category)?)
    }

    async fn calculate_production(
        &self,
        recipe_name: String,
        quantity: f64,
    ) -> BackendResult<ProductionResult> {
        self.ensure_running()?;
        Self::validate_quantity(quantity)?;
        let recipe = self.load_recipe(&recipe_name)?;

        Ok(ProductionResult {
            total_portion_weight: recipe.portion_weight * quantity,
            ingredients: Self::scale(&recipe, quantity),
        })
    }

    async fn calculate_cost(
        &self,
        recipe_name: String,
        quantity: f64,
    ) -> BackendResult<Vec<CostBreakdownLine>> {
        self.ensure_running()?;
        Self::validate_quantity(quantity)?;
        let recipe = self.load_recipe(&recipe_name)?;

        // 服务端口径: 用量 × 份数 × 单价，不换算单位
        let mut breakdown = Vec::with_capacity(recipe.ingredients.len());
        for ing in &recipe.ingredients {
            let price = self
                .raw_materials
                .find_by_id(ing.raw_material_id)?
                .map(|rm| rm.price_per_unit)
                .unwrap_or(0.0);
            breakdown.push(CostBreakdownLine {
                cost_per_unit: price,
                total_cost: ing.quantity_per_portion * quantity * price,
            });
        }
        Ok(breakdown)
    }

    #[instrument(skip(self))]
    async fn get_store_issue_slip(
        &self,
        recipe_name: String,
        quantity: f64,
    ) -> BackendResult<StoreIssueSlip> {
        self.ensure_running()?;
        Self::validate_quantity(quantity)?;
        let recipe = self.load_recipe(&recipe_name)?;

        self.recipes.log_production(&recipe.name, quantity)?;

        Ok(StoreIssueSlip {
            date: Utc::now().date_naive().to_string(),
            recipe_name: recipe.name.clone(),
            production_quantity: quantity,
            ingredients: Self::scale(&recipe, quantity),
        })
    }

    async fn get_dashboard_stats(&self) -> BackendResult<DashboardStats> {
        self.ensure_running()?;
        Ok(DashboardStats {
            total_recipes: self.recipes.count()?,
            total_ingredients: self.raw_materials.count()?,
            most_produced_item: self.recipes.most_produced()?.unwrap_or_default(),
            average_food_cost_percentage: 0.0,
        })
    }

    async fn check_health(&self) -> BackendResult<bool> {
        self.ensure_running()?;
        Ok(true)
    }

    async fn setup_admin(&self) -> BackendResult<()> {
        self.ensure_running()?;
        self.admin.mark_set_up()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendErrorKind;

    fn backend() -> SqliteKitchenBackend {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        SqliteKitchenBackend::from_connection(Arc::new(Mutex::new(conn)))
    }

    async fn seeded() -> (SqliteKitchenBackend, u64, u64) {
        let backend = backend();
        backend.setup_admin().await.unwrap();
        let oil = backend
            .add_raw_material("Sunflower Oil".into(), "L".into(), 200.0)
            .await
            .unwrap();
        let rice = backend
            .add_raw_material("Rice".into(), "Kg".into(), 60.0)
            .await
            .unwrap();
        backend
            .add_recipe(Recipe {
                name: "Fried Rice".into(),
                category: "Chinese".into(),
                portion_weight: 300.0,
                ingredients: vec![
                    Ingredient {
                        raw_material_id: oil,
                        quantity_per_portion: 30.0,
                        unit: "ml".into(),
                    },
                    Ingredient {
                        raw_material_id: rice,
                        quantity_per_portion: 0.2,
                        unit: "Kg".into(),
                    },
                ],
            })
            .await
            .unwrap();
        (backend, oil, rice)
    }

    #[tokio::test]
    async fn test_未初始化管理员时拒绝写操作() {
        let backend = backend();
        let err = backend
            .add_raw_material("Salt".into(), "Kg".into(), 20.0)
            .await
            .unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Auth);
        assert_eq!(err.message, "Admin not set up");
    }

    #[tokio::test]
    async fn test_原料校验文本() {
        let backend = backend();
        backend.setup_admin().await.unwrap();

        let err = backend.add_raw_material("  ".into(), "Kg".into(), 1.0).await.unwrap_err();
        assert_eq!(err.message, "Raw material name cannot be empty");

        let err = backend.add_raw_material("Salt".into(), "Kg".into(), -1.0).await.unwrap_err();
        assert_eq!(err.message, "Price per unit cannot be negative");

        backend.add_raw_material("Salt".into(), "Kg".into(), 20.0).await.unwrap();
        let err = backend.add_raw_material("salt".into(), "Kg".into(), 22.0).await.unwrap_err();
        assert_eq!(err.message, "Raw material with this name already exists");

        let err = backend.delete_raw_material(999).await.unwrap_err();
        assert_eq!(err.message, "Raw material not found");
    }

    #[tokio::test]
    async fn test_calculate_cost_不换算单位() {
        let (backend, _, _) = seeded().await;
        let breakdown = backend.calculate_cost("Fried Rice".into(), 10.0).await.unwrap();

        // 30 ml × 10 × 200 = 60000（未换算）
        assert_eq!(breakdown[0].total_cost, 60000.0);
        assert_eq!(breakdown[0].cost_per_unit, 200.0);
        // 0.2 Kg × 10 × 60 = 120
        assert!((breakdown[1].total_cost - 120.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_calculate_production_and_slip() {
        let (backend, oil, _) = seeded().await;
        let production = backend.calculate_production("Fried Rice".into(), 4.0).await.unwrap();
        assert_eq!(production.total_portion_weight, 1200.0);
        assert_eq!(production.ingredients[0].raw_material_id, oil);
        assert_eq!(production.ingredients[0].quantity_per_portion, 120.0);

        let slip = backend.get_store_issue_slip("Fried Rice".into(), 4.0).await.unwrap();
        assert_eq!(slip.recipe_name, "Fried Rice");
        assert_eq!(slip.production_quantity, 4.0);

        let stats = backend.get_dashboard_stats().await.unwrap();
        assert_eq!(stats.total_recipes, 1);
        assert_eq!(stats.total_ingredients, 2);
        assert_eq!(stats.most_produced_item, "Fried Rice");

        let err = backend.calculate_production("Nope".into(), 1.0).await.unwrap_err();
        assert_eq!(err.message, "Recipe not found");
        let err = backend.calculate_production("Fried Rice".into(), 0.0).await.unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_停机与恢复() {
        let backend = backend();
        assert!(backend.check_health().await.unwrap());

        backend.stop();
        let err = backend.check_health().await.unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::ServiceUnavailable);
        assert!(backend.get_all_raw_materials().await.is_err());

        backend.start();
        assert!(backend.check_health().await.unwrap());
    }
}

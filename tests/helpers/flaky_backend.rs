// ==========================================
// 可编排故障的后端 - 用于重试与健康监测测试
// ==========================================
// 职责: 包装本地 SQLite 后端，按操作名注入预设错误、统计调用次数
// ==========================================

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use kitchen_cost_control::backend::{BackendError, BackendResult, KitchenBackend, SqliteKitchenBackend};
use kitchen_cost_control::domain::{
    CostBreakdownLine, DashboardStats, ProductionResult, RawMaterial, Recipe, StoreIssueSlip,
};

/// 可编排故障的后端
///
/// - fail_next(op, err, n): 接下来 n 次调用 op 返回 err
/// - break_recipe(name): 该菜谱的 calculate_production 永久返回 Validation
/// - script_health(..): check_health 依次返回预设结果，耗尽后委托内部后端
pub struct FlakyBackend {
    inner: Arc<SqliteKitchenBackend>,
    failures: Mutex<HashMap<&'static str, VecDeque<BackendError>>>,
    broken_recipes: Mutex<HashSet<String>>,
    health_script: Mutex<VecDeque<BackendResult<bool>>>,
    health_delay: Mutex<Option<Duration>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    total_calls: AtomicUsize,
}

impl FlakyBackend {
    pub fn new(inner: Arc<SqliteKitchenBackend>) -> Self {
        Self {
            inner,
            failures: Mutex::new(HashMap::new()),
            broken_recipes: Mutex::new(HashSet::new()),
            health_script: Mutex::new(VecDeque::new()),
            health_delay: Mutex::new(None),
            calls: Mutex::new(HashMap::new()),
            total_calls: AtomicUsize::new(0),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(
            SqliteKitchenBackend::new(":memory:").expect("无法创建内存后端"),
        ))
    }

    pub fn inner(&self) -> &SqliteKitchenBackend {
        &self.inner
    }

    pub fn fail_next(&self, op: &'static str, err: BackendError, times: usize) {
        let mut failures = self.failures.lock().unwrap();
        let queue = failures.entry(op).or_default();
        for _ in 0..times {
            queue.push_back(err.clone());
        }
    }

    pub fn break_recipe(&self, name: &str) {
        self.broken_recipes.lock().unwrap().insert(name.to_string());
    }

    pub fn script_health(&self, results: Vec<BackendResult<bool>>) {
        self.health_script.lock().unwrap().extend(results);
    }

    pub fn delay_health(&self, delay: Duration) {
        *self.health_delay.lock().unwrap() = Some(delay);
    }

    /// 指定操作的调用次数
    pub fn calls(&self, op: &str) -> usize {
        self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    fn gate(&self, op: &'static str) -> BackendResult<()> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().unwrap().entry(op).or_insert(0) += 1;

        match self
            .failures
            .lock()
            .unwrap()
            .get_mut(op)
            .and_then(|queue| queue.pop_front())
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl KitchenBackend for FlakyBackend {
    async fn add_raw_material(
        &self,
        raw_material_name: String,
        unit_type: String,
        price_per_unit: f64,
    ) -> BackendResult<u64> {
        self.gate("add_raw_material")?;
        self.inner
            .add_raw_material(raw_material_name, unit_type, price_per_unit)
            .await
    }

    async fn edit_raw_material(
        &self,
        id: u64,
        raw_material_name: String,
        unit_type: String,
        price_per_unit: f64,
    ) -> BackendResult<()> {
        self.gate("edit_raw_material")?;
        self.inner
            .edit_raw_material(id, raw_material_name, unit_type, price_per_unit)
            .await
    }

    async fn delete_raw_material(&self, id: u64) -> BackendResult<()> {
        self.gate("delete_raw_material")?;
        self.inner.delete_raw_material(id).await
    }

    async fn get_all_raw_materials(&self) -> BackendResult<Vec<RawMaterial>> {
        self.gate("get_all_raw_materials")?;
        self.inner.get_all_raw_materials().await
    }

    async fn get_raw_material(&self, id: u64) -> BackendResult<Option<RawMaterial>> {
        self.gate("get_raw_material")?;
        self.inner.get_raw_material(id).await
    }

    async fn add_recipe(&self, recipe: Recipe) -> BackendResult<()> {
        self.gate("add_recipe")?;
        self.inner.add_recipe(recipe).await
    }

    async fn get_all_categories(&self) -> BackendResult<Vec<String>> {
        self.gate("get_all_categories")?;
        self.inner.get_all_categories().await
    }

    async fn get_recipes_by_category(&self, category: String) -> BackendResult<Vec<String>> {
        self.gate("get_recipes_by_category")?;
        self.inner.get_recipes_by_category(category).await
    }

    async fn calculate_production(
        &self,
        recipe_name: String,
        quantity: f64,
    ) -> BackendResult<ProductionResult> {
        self.gate("calculate_production")?;
        if self.broken_recipes.lock().unwrap().contains(&recipe_name) {
            return Err(BackendError::validation("Recipe not found"));
        }
        self.inner.calculate_production(recipe_name, quantity).await
    }

    async fn calculate_cost(
        &self,
        recipe_name: String,
        quantity: f64,
    ) -> BackendResult<Vec<CostBreakdownLine>> {
        self.gate("calculate_cost")?;
        self.inner.calculate_cost(recipe_name, quantity).await
    }

    async fn get_store_issue_slip(
        &self,
        recipe_name: String,
        quantity: f64,
    ) -> BackendResult<StoreIssueSlip> {
        self.gate("get_store_issue_slip")?;
        self.inner.get_store_issue_slip(recipe_name, quantity).await
    }

    async fn get_dashboard_stats(&self) -> BackendResult<DashboardStats> {
        self.gate("get_dashboard_stats")?;
        self.inner.get_dashboard_stats().await
    }

    async fn check_health(&self) -> BackendResult<bool> {
        self.gate("check_health")?;

        let delay = *self.health_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.health_script.lock().unwrap().pop_front();
        match scripted {
            Some(result) => result,
            None => self.inner.check_health().await,
        }
    }

    async fn setup_admin(&self) -> BackendResult<()> {
        self.gate("setup_admin")?;
        self.inner.setup_admin().await
    }
}

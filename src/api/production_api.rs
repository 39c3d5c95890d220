// ==========================================
// 厨房成本控制系统 - 生产 API
// ==========================================
// 职责: 生产计算单、出库单、本地生产历史
// 说明: 生产历史中的用量换算到原料计价单位，便于按原料汇总
// ==========================================

use crate::api::client::BackendClient;
use crate::api::cost_api::CostApi;
use crate::api::error::{ApiError, ApiResult};
use crate::cache::QueryKey;
use crate::domain::production::{ConsumedIngredient, ProductionRecord};
use crate::domain::raw_material::RawMaterial;
use crate::domain::recipe::{Ingredient, StoreIssueSlip};
use crate::engine::{CostRecalculator, UnitConverter};
use crate::repository::ProductionHistoryRepository;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// 配料展示行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientLine {
    pub raw_material_id: u64,
    pub raw_material_name: String,
    pub quantity: f64,
    pub unit: String,
    pub display: String, // 自动升级单位后的文本，如 "2.5 Kg"
}

/// 生产计算单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionSheet {
    pub recipe_name: String,
    pub quantity: f64,
    pub total_portion_weight: f64,
    pub total_weight_display: String,
    pub lines: Vec<IngredientLine>,
}

/// 出库单（含展示行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreIssueSlipView {
    pub slip: StoreIssueSlip,
    pub lines: Vec<IngredientLine>,
}

pub struct ProductionApi {
    client: BackendClient,
    cost_api: Arc<CostApi>,
    history_repo: Arc<ProductionHistoryRepository>,
    converter: UnitConverter,
}

impl ProductionApi {
    pub fn new(
        client: BackendClient,
        cost_api: Arc<CostApi>,
        history_repo: Arc<ProductionHistoryRepository>,
    ) -> Self {
        Self {
            client,
            cost_api,
            history_repo,
            converter: UnitConverter::new(),
        }
    }

    fn ensure_quantity(quantity: f64) -> ApiResult<()> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(ApiError::InvalidInput(format!("生产份数必须大于0: {}", quantity)));
        }
        Ok(())
    }

    fn lines(&self, ingredients: &[Ingredient], raw_materials: &HashMap<u64, RawMaterial>) -> Vec<IngredientLine> {
        ingredients
            .iter()
            .map(|ing| IngredientLine {
                raw_material_id: ing.raw_material_id,
                raw_material_name: raw_materials
                    .get(&ing.raw_material_id)
                    .map(|rm| rm.raw_material_name.clone())
                    .unwrap_or_else(|| format!("ID: {}", ing.raw_material_id)),
                quantity: ing.quantity_per_portion,
                unit: ing.unit.clone(),
                display: self.converter.format_quantity(ing.quantity_per_portion, &ing.unit),
            })
            .collect()
    }

    /// 生产计算单（不记录生产）
    pub async fn production_sheet(&self, recipe_name: &str, quantity: f64) -> ApiResult<ProductionSheet> {
        Self::ensure_quantity(quantity)?;

        let production = self
            .client
            .call("calculate_production", |b| {
                let name = recipe_name.to_string();
                async move { b.calculate_production(name, quantity).await }
            })
            .await?;
        let raw_materials = CostRecalculator::index_by_id(&self.client.raw_materials().await?);

        Ok(ProductionSheet {
            recipe_name: recipe_name.to_string(),
            quantity,
            total_portion_weight: production.total_portion_weight,
            total_weight_display: self
                .converter
                .format_quantity(production.total_portion_weight, "g"),
            lines: self.lines(&production.ingredients, &raw_materials),
        })
    }

    /// 生成出库单（后端同时记入生产日志，仪表盘统计随之失效）
    pub async fn store_issue_slip(&self, recipe_name: &str, quantity: f64) -> ApiResult<StoreIssueSlipView> {
        Self::ensure_quantity(quantity)?;

        let slip = self
            .client
            .call("get_store_issue_slip", |b| {
                let name = recipe_name.to_string();
                async move { b.get_store_issue_slip(name, quantity).await }
            })
            .await?;
        self.client.cache().invalidate(&QueryKey::DashboardStats);

        let raw_materials = CostRecalculator::index_by_id(&self.client.raw_materials().await?);
        let lines = self.lines(&slip.ingredients, &raw_materials);
        Ok(StoreIssueSlipView { slip, lines })
    }

    /// 记录一次生产到本地历史
    ///
    /// 缺价或无成本数据时成本记为 0（记录 warn），其他错误直接返回
    pub async fn record_production(&self, recipe_name: &str, quantity: f64) -> ApiResult<ProductionRecord> {
        Self::ensure_quantity(quantity)?;

        let cost = match self.cost_api.calculate_cost(recipe_name, quantity).await {
            Ok(analysis) => analysis.total_batch_cost,
            Err(e @ (ApiError::MissingCosts { .. } | ApiError::NoCostData)) => {
                warn!(recipe = %recipe_name, error = %e, "成本不可用，生产记录成本记为0");
                0.0
            }
            Err(e) => return Err(e),
        };

        let production = self
            .client
            .call("calculate_production", |b| {
                let name = recipe_name.to_string();
                async move { b.calculate_production(name, quantity).await }
            })
            .await?;
        let raw_materials = CostRecalculator::index_by_id(&self.client.raw_materials().await?);

        let ingredients = production
            .ingredients
            .iter()
            .map(|ing| match raw_materials.get(&ing.raw_material_id) {
                Some(rm) => ConsumedIngredient {
                    name: rm.raw_material_name.clone(),
                    quantity: self
                        .converter
                        .convert(ing.quantity_per_portion, &ing.unit, &rm.unit_type),
                    unit: rm.unit_type.clone(),
                },
                None => ConsumedIngredient {
                    name: format!("ID: {}", ing.raw_material_id),
                    quantity: ing.quantity_per_portion,
                    unit: ing.unit.clone(),
                },
            })
            .collect();

        let record = ProductionRecord {
            record_id: Uuid::new_v4().to_string(),
            produced_at: Utc::now(),
            recipe_name: recipe_name.to_string(),
            quantity,
            cost,
            ingredients,
        };
        self.history_repo.append(&record)?;

        info!(record_id = %record.record_id, recipe = %recipe_name, quantity, cost, "生产记录已保存");
        Ok(record)
    }

    /// 全部生产历史
    pub fn production_history(&self) -> ApiResult<Vec<ProductionRecord>> {
        Ok(self.history_repo.list_all()?)
    }

    /// 指定日期的生产记录
    pub fn productions_on(&self, date: NaiveDate) -> ApiResult<Vec<ProductionRecord>> {
        Ok(self.history_repo.list_for_date(date)?)
    }

    /// 今日生产记录（UTC）
    pub fn todays_productions(&self) -> ApiResult<Vec<ProductionRecord>> {
        self.productions_on(Utc::now().date_naive())
    }

    /// 清空生产历史
    pub fn clear_history(&self) -> ApiResult<usize> {
        let removed = self.history_repo.clear()?;
        info!(removed, "生产历史已清空");
        Ok(removed)
    }
}

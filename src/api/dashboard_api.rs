// ==========================================
// 厨房成本控制系统 - 仪表盘 API
// ==========================================
// 数据来源:
// - 后端 get_dashboard_stats（缓存）
// - 本地生产历史（总消耗、Top 5 原料、总成本）
// ==========================================

use crate::api::client::BackendClient;
use crate::api::error::ApiResult;
use crate::cache::QueryKey;
use crate::domain::production::DashboardStats;
use crate::engine::consumption::TOP_INGREDIENT_LIMIT;
use crate::engine::{format_currency, ConsumptionAnalyzer, IngredientConsumption};
use crate::repository::ProductionHistoryRepository;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 生产汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionSummary {
    pub date: Option<NaiveDate>, // None 表示全部历史
    pub production_count: usize,
    pub total_cost: f64,
    pub total_cost_display: String,
    pub top_ingredients: Vec<IngredientConsumption>,
    pub total_consumption: Vec<IngredientConsumption>, // 按名称排序
}

pub struct DashboardApi {
    client: BackendClient,
    history_repo: Arc<ProductionHistoryRepository>,
    analyzer: ConsumptionAnalyzer,
}

impl DashboardApi {
    pub fn new(client: BackendClient, history_repo: Arc<ProductionHistoryRepository>) -> Self {
        Self {
            client,
            history_repo,
            analyzer: ConsumptionAnalyzer::new(),
        }
    }

    /// 仪表盘统计（缓存）
    pub async fn get_stats(&self) -> ApiResult<DashboardStats> {
        self.client
            .cached(QueryKey::DashboardStats, "get_dashboard_stats", |b| async move {
                b.get_dashboard_stats().await
            })
            .await
    }

    /// 生产汇总
    ///
    /// # 参数
    /// - date: 指定日期；None 汇总全部历史
    pub fn production_summary(&self, date: Option<NaiveDate>) -> ApiResult<ProductionSummary> {
        let records = match date {
            Some(d) => self.history_repo.list_for_date(d)?,
            None => self.history_repo.list_all()?,
        };

        let mut total_consumption: Vec<IngredientConsumption> = self
            .analyzer
            .total_consumption(&records)
            .into_iter()
            .map(|(name, quantity)| IngredientConsumption { name, quantity })
            .collect();
        total_consumption.sort_by(|a, b| a.name.cmp(&b.name));

        let total_cost = self.analyzer.total_cost(&records);

        Ok(ProductionSummary {
            date,
            production_count: records.len(),
            total_cost,
            total_cost_display: format_currency(total_cost),
            top_ingredients: self.analyzer.top_ingredients(&records, TOP_INGREDIENT_LIMIT),
            total_consumption,
        })
    }
}

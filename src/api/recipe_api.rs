// ==========================================
// 厨房成本控制系统 - 菜谱 API
// ==========================================
// 职责: 菜谱查询（分类 → 名称 → 单份配方）与保存
// 规则:
// - 单个菜谱加载失败时跳过（记录 warn），不影响其他菜谱；此时结果不缓存
// - 保存成功后失效菜谱相关缓存与仪表盘统计
// ==========================================

use crate::api::client::BackendClient;
use crate::api::error::{ApiError, ApiResult};
use crate::cache::QueryKey;
use crate::domain::recipe::Recipe;
use crate::domain::types::is_known_category;
use crate::i18n::{t, t_with_args};
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct RecipeApi {
    client: BackendClient,
}

impl RecipeApi {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// 绑定请求级取消令牌的副本（对话框关闭后不再重试）
    pub fn with_cancel(&self, token: CancellationToken) -> Self {
        Self {
            client: self.client.with_cancel(token),
        }
    }

    /// 已使用的分类（缓存）
    pub async fn list_categories(&self) -> ApiResult<Vec<String>> {
        self.client
            .cached(QueryKey::Categories, "get_all_categories", |b| async move {
                b.get_all_categories().await
            })
            .await
    }

    /// 分类下的菜谱名称（缓存）
    pub async fn list_recipe_names(&self, category: &str) -> ApiResult<Vec<String>> {
        let key = QueryKey::RecipesByCategory(category.to_string());
        self.client
            .cached(key, "get_recipes_by_category", |b| {
                let category = category.to_string();
                async move { b.get_recipes_by_category(category).await }
            })
            .await
    }

    /// 全部菜谱（缓存）
    ///
    /// 分类 → 名称 → calculate_production(name, 1)，结果为单份配方
    pub async fn list_recipes(&self) -> ApiResult<Vec<Recipe>> {
        if let Some(hit) = self.client.cache().get::<Vec<Recipe>>(&QueryKey::Recipes) {
            return Ok(hit);
        }

        let categories = self.list_categories().await?;
        let name_lists = join_all(categories.iter().map(|c| self.list_recipe_names(c))).await;

        let mut pending = Vec::new();
        for (category, names) in categories.iter().zip(name_lists) {
            for name in names? {
                pending.push((category.clone(), name));
            }
        }

        let loaded = join_all(pending.into_iter().map(|(category, name)| async move {
            let result = self.load_recipe(&category, &name).await;
            (name, result)
        }))
        .await;

        let mut recipes = Vec::with_capacity(loaded.len());
        let mut skipped = 0usize;
        for (name, result) in loaded {
            match result {
                Ok(recipe) => recipes.push(recipe),
                Err(ApiError::Cancelled(op)) => return Err(ApiError::Cancelled(op)),
                Err(e) => {
                    skipped += 1;
                    warn!(recipe = %name, error = %e, "菜谱加载失败，已跳过");
                }
            }
        }

        // 不完整的列表不回填缓存，下次读取重新加载
        if skipped == 0 {
            self.client.cache().put(QueryKey::Recipes, &recipes);
        } else {
            debug!(skipped, loaded = recipes.len(), "菜谱列表不完整，未写入缓存");
        }
        Ok(recipes)
    }

    /// 按名称查找菜谱
    pub async fn get_recipe(&self, name: &str) -> ApiResult<Recipe> {
        self.list_recipes()
            .await?
            .into_iter()
            .find(|r| r.name == name)
            .ok_or_else(|| ApiError::NotFound(format!("菜谱{}不存在", name)))
    }

    async fn load_recipe(&self, category: &str, name: &str) -> ApiResult<Recipe> {
        let production = self
            .client
            .call("calculate_production", |b| {
                let name = name.to_string();
                async move { b.calculate_production(name, 1.0).await }
            })
            .await?;

        Ok(Recipe {
            name: name.to_string(),
            category: category.to_string(),
            portion_weight: production.total_portion_weight,
            ingredients: production.ingredients,
        })
    }

    /// 新增或覆盖菜谱
    ///
    /// # 返回
    /// - Err(Validation): 必填项缺失、分类未知、无配料或用量非法
    pub async fn save_recipe(&self, recipe: &Recipe) -> ApiResult<()> {
        validate_recipe(recipe)?;

        self.client
            .call("add_recipe", |b| {
                let recipe = recipe.clone();
                async move { b.add_recipe(recipe).await }
            })
            .await?;

        let cache = self.client.cache();
        cache.invalidate_where(QueryKey::is_recipe_family);
        cache.invalidate(&QueryKey::DashboardStats);
        info!(recipe = %recipe.name, ingredients = recipe.ingredients.len(), "菜谱已保存");
        Ok(())
    }
}

/// 菜谱表单校验
pub fn validate_recipe(recipe: &Recipe) -> ApiResult<()> {
    if recipe.name.trim().is_empty()
        || recipe.category.trim().is_empty()
        || !recipe.portion_weight.is_finite()
        || recipe.portion_weight <= 0.0
    {
        return Err(ApiError::Validation(t("recipe_form.required_fields")));
    }
    if !is_known_category(&recipe.category) {
        return Err(ApiError::Validation(t_with_args(
            "recipe_form.unknown_category",
            &[("category", &recipe.category)],
        )));
    }
    if recipe.ingredients.is_empty() {
        return Err(ApiError::Validation(t("recipe_form.no_ingredients")));
    }
    for ing in &recipe.ingredients {
        if !ing.quantity_per_portion.is_finite() || ing.quantity_per_portion <= 0.0 {
            return Err(ApiError::Validation(t_with_args(
                "recipe_form.invalid_quantity",
                &[("id", &ing.raw_material_id.to_string())],
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recipe::Ingredient;

    fn recipe() -> Recipe {
        Recipe {
            name: "Masala Dosa".into(),
            category: "Tiffin".into(),
            portion_weight: 220.0,
            ingredients: vec![Ingredient {
                raw_material_id: 1,
                quantity_per_portion: 80.0,
                unit: "g".into(),
            }],
        }
    }

    #[test]
    fn test_validate_recipe() {
        assert!(validate_recipe(&recipe()).is_ok());

        let mut r = recipe();
        r.name = " ".into();
        assert!(validate_recipe(&r).is_err());

        let mut r = recipe();
        r.category = "Dessert".into();
        assert!(validate_recipe(&r).is_err());

        let mut r = recipe();
        r.ingredients.clear();
        assert!(validate_recipe(&r).is_err());

        let mut r = recipe();
        r.ingredients[0].quantity_per_portion = 0.0;
        assert!(validate_recipe(&r).is_err());
    }
}

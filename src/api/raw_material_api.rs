// ==========================================
// 厨房成本控制系统 - 原料 API
// ==========================================
// 职责: 原料主数据的查询与维护
// 规则:
// - 表单以引用传入，失败时调用方的表单数据保持不变
// - 写操作成功后只失效原料列表与仪表盘统计
// ==========================================

use crate::api::client::BackendClient;
use crate::api::error::{ApiError, ApiResult};
use crate::cache::QueryKey;
use crate::domain::raw_material::RawMaterial;
use crate::domain::types::UnitType;
use crate::i18n::t;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

// ==========================================
// RawMaterialForm - 原料表单
// ==========================================
/// 前端原料表单（价格为原始输入文本）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMaterialForm {
    pub raw_material_name: String,
    pub unit_type: String,
    pub price_per_unit: String,
}

/// 校验通过的表单值
#[derive(Debug, Clone, PartialEq)]
struct ValidatedRawMaterial {
    raw_material_name: String,
    unit_type: String,
    price_per_unit: f64,
}

impl RawMaterialForm {
    pub fn new(
        raw_material_name: impl Into<String>,
        unit_type: impl Into<String>,
        price_per_unit: impl Into<String>,
    ) -> Self {
        Self {
            raw_material_name: raw_material_name.into(),
            unit_type: unit_type.into(),
            price_per_unit: price_per_unit.into(),
        }
    }

    /// 用已有原料预填表单（编辑场景）
    pub fn from_raw_material(rm: &RawMaterial) -> Self {
        Self {
            raw_material_name: rm.raw_material_name.clone(),
            unit_type: rm.unit_type.clone(),
            price_per_unit: rm.price_per_unit.to_string(),
        }
    }

    fn validate(&self) -> ApiResult<ValidatedRawMaterial> {
        let name = self.raw_material_name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation(t("raw_material_form.name_required")));
        }

        let unit = UnitType::parse(&self.unit_type)
            .ok_or_else(|| ApiError::Validation(t("raw_material_form.unit_required")))?;

        let price = self
            .price_per_unit
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite() && *p >= 0.0)
            .ok_or_else(|| ApiError::Validation(t("raw_material_form.price_invalid")))?;

        Ok(ValidatedRawMaterial {
            raw_material_name: name.to_string(),
            unit_type: unit.as_str().to_string(),
            price_per_unit: price,
        })
    }
}

// ==========================================
// RawMaterialApi
// ==========================================
pub struct RawMaterialApi {
    client: BackendClient,
}

impl RawMaterialApi {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// 绑定请求级取消令牌的副本（对话框关闭后不再重试）
    pub fn with_cancel(&self, token: CancellationToken) -> Self {
        Self {
            client: self.client.with_cancel(token),
        }
    }

    /// 原料列表（缓存）
    pub async fn list_raw_materials(&self) -> ApiResult<Vec<RawMaterial>> {
        self.client.raw_materials().await
    }

    /// 按 id 查询原料
    pub async fn get_raw_material(&self, id: u64) -> ApiResult<Option<RawMaterial>> {
        self.client
            .call("get_raw_material", |b| async move { b.get_raw_material(id).await })
            .await
    }

    /// 新增原料
    ///
    /// # 返回
    /// - Ok(u64): 新原料 id
    /// - Err(Validation): 表单校验失败或名称重复（忽略大小写）
    pub async fn add_raw_material(&self, form: &RawMaterialForm) -> ApiResult<u64> {
        let v = form.validate()?;
        self.ensure_unique_name(&v.raw_material_name, None).await?;

        let id = self
            .client
            .call("add_raw_material", |b| {
                let v = v.clone();
                async move {
                    b.add_raw_material(v.raw_material_name, v.unit_type, v.price_per_unit)
                        .await
                }
            })
            .await?;

        self.invalidate();
        info!(id, name = %v.raw_material_name, "原料已新增");
        Ok(id)
    }

    /// 编辑原料
    pub async fn edit_raw_material(&self, id: u64, form: &RawMaterialForm) -> ApiResult<()> {
        let v = form.validate()?;
        self.ensure_unique_name(&v.raw_material_name, Some(id)).await?;

        self.client
            .call("edit_raw_material", |b| {
                let v = v.clone();
                async move {
                    b.edit_raw_material(id, v.raw_material_name, v.unit_type, v.price_per_unit)
                        .await
                }
            })
            .await?;

        self.invalidate();
        info!(id, "原料已更新");
        Ok(())
    }

    /// 删除原料
    pub async fn delete_raw_material(&self, id: u64) -> ApiResult<()> {
        self.client
            .call("delete_raw_material", |b| async move { b.delete_raw_material(id).await })
            .await?;

        self.invalidate();
        info!(id, "原料已删除");
        Ok(())
    }

    // 名称重复检查（忽略大小写，编辑时排除自身）
    async fn ensure_unique_name(&self, name: &str, editing_id: Option<u64>) -> ApiResult<()> {
        let existing = self.client.raw_materials().await?;
        let duplicate = existing
            .iter()
            .any(|rm| rm.name_matches(name) && Some(rm.id) != editing_id);

        if duplicate {
            debug!(name, "原料名称重复");
            return Err(ApiError::Validation(t("raw_material_form.duplicate_name")));
        }
        Ok(())
    }

    fn invalidate(&self) {
        let cache = self.client.cache();
        cache.invalidate(&QueryKey::RawMaterials);
        cache.invalidate(&QueryKey::DashboardStats);
    }
}

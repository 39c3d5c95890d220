// ==========================================
// 厨房成本控制系统 - 受监督的后端客户端
// ==========================================
// 职责: 所有 API 对后端的调用统一经过 RetrySupervisor
// 说明: 共享应用级取消令牌，应用关闭后不再发起新的重试；
//       with_cancel 可再叠加单次请求的令牌（对话框关闭等场景）
// ==========================================

use crate::api::error::ApiResult;
use crate::backend::{BackendResult, KitchenBackend};
use crate::cache::{QueryCache, QueryKey};
use crate::domain::raw_material::RawMaterial;
use crate::supervisor::retry::RetrySupervisor;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct BackendClient {
    backend: Arc<dyn KitchenBackend>,
    supervisor: RetrySupervisor,
    cache: Arc<QueryCache>,
    cancel: CancellationToken,
    request: Option<CancellationToken>, // 调用方的请求级令牌
}

impl BackendClient {
    pub fn new(
        backend: Arc<dyn KitchenBackend>,
        supervisor: RetrySupervisor,
        cache: Arc<QueryCache>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            backend,
            supervisor,
            cache,
            cancel,
            request: None,
        }
    }

    /// 绑定请求级取消令牌
    ///
    /// 令牌触发后不再发起新的尝试，返回 Cancelled；
    /// 不影响应用级令牌、其他请求和健康监测
    pub fn with_cancel(&self, token: CancellationToken) -> Self {
        Self {
            request: Some(token),
            ..self.clone()
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// 带重试调用后端
    ///
    /// # 参数
    /// - operation: 操作名（日志用）
    /// - f: 以后端句柄构造一次调用；每次重试都会重新调用
    pub async fn call<T, F, Fut>(&self, operation: &str, f: F) -> ApiResult<T>
    where
        F: Fn(Arc<dyn KitchenBackend>) -> Fut,
        Fut: Future<Output = BackendResult<T>>,
    {
        let backend = Arc::clone(&self.backend);
        let guard = self.cancel.child_token();
        if self.request.as_ref().is_some_and(CancellationToken::is_cancelled) {
            guard.cancel();
        }

        let run = self
            .supervisor
            .run(operation, &guard, || f(Arc::clone(&backend)));
        tokio::pin!(run);

        // 请求取消时只停止后续重试，进行中的那次尝试照常完成
        let result = match &self.request {
            Some(request) => tokio::select! {
                r = &mut run => r,
                _ = request.cancelled() => {
                    guard.cancel();
                    run.await
                }
            },
            None => run.await,
        }?;
        Ok(result)
    }

    /// 先查缓存，未命中再调用后端并回填
    pub async fn cached<T, F, Fut>(&self, key: QueryKey, operation: &str, f: F) -> ApiResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: Fn(Arc<dyn KitchenBackend>) -> Fut,
        Fut: Future<Output = BackendResult<T>>,
    {
        if let Some(hit) = self.cache.get::<T>(&key) {
            return Ok(hit);
        }
        let value = self.call(operation, f).await?;
        self.cache.put(key, &value);
        Ok(value)
    }

    /// 原料列表（多个 API 共用同一缓存键）
    pub async fn raw_materials(&self) -> ApiResult<Vec<RawMaterial>> {
        self.cached(QueryKey::RawMaterials, "get_all_raw_materials", |b| async move {
            b.get_all_raw_materials().await
        })
        .await
    }
}

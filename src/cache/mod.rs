// ==========================================
// 厨房成本控制系统 - 查询缓存
// ==========================================
// 职责: 按查询键缓存后端读结果（JSON 序列化）
// 失效规则:
// - 写操作成功后只失效自身相关集合
// - 服务恢复（Unhealthy → Healthy）时全部失效
// ==========================================

use crate::supervisor::health::CacheInvalidator;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// 缓存查询键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    RawMaterials,
    Recipes,
    Categories,
    RecipesByCategory(String),
    DashboardStats,
}

impl QueryKey {
    /// 是否属于菜谱相关集合（菜谱写入后需一并失效）
    pub fn is_recipe_family(&self) -> bool {
        matches!(
            self,
            QueryKey::Recipes | QueryKey::Categories | QueryKey::RecipesByCategory(_)
        )
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    fetched_at: DateTime<Utc>,
}

// ==========================================
// QueryCache
// ==========================================
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
    generation: AtomicU64, // 每次失效 +1
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    // 缓存内容可随时重建，锁中毒时直接沿用内部数据
    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 读取缓存（反序列化失败视为未命中）
    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let entry = self.lock().get(key).cloned()?;
        match serde_json::from_value(entry.value) {
            Ok(v) => {
                debug!(?key, "缓存命中");
                Some(v)
            }
            Err(e) => {
                warn!(?key, error = %e, "缓存条目反序列化失败，按未命中处理");
                None
            }
        }
    }

    /// 写入缓存
    pub fn put<T: Serialize>(&self, key: QueryKey, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.lock().insert(
                    key,
                    CacheEntry {
                        value,
                        fetched_at: Utc::now(),
                    },
                );
            }
            Err(e) => warn!(?key, error = %e, "缓存条目序列化失败，跳过写入"),
        }
    }

    /// 条目的获取时间
    pub fn fetched_at(&self, key: &QueryKey) -> Option<DateTime<Utc>> {
        self.lock().get(key).map(|e| e.fetched_at)
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// 失效单个键
    pub fn invalidate(&self, key: &QueryKey) {
        if self.lock().remove(key).is_some() {
            debug!(?key, "缓存已失效");
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// 按条件失效
    pub fn invalidate_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&QueryKey) -> bool,
    {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|k, _| !predicate(k));
        let removed = before - entries.len();
        drop(entries);

        self.generation.fetch_add(1, Ordering::SeqCst);
        debug!(removed, "按条件失效缓存");
        removed
    }

    /// 全部失效
    pub fn invalidate_all(&self) {
        let removed = {
            let mut entries = self.lock();
            let n = entries.len();
            entries.clear();
            n
        };
        self.generation.fetch_add(1, Ordering::SeqCst);
        info!(removed, "全部查询缓存已失效");
    }

    /// 失效代数（测试与诊断用）
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

impl CacheInvalidator for QueryCache {
    fn invalidate_all(&self) {
        QueryCache::invalidate_all(self);
    }
}
